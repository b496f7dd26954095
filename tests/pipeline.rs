//! Provider, transaction handle and command pipeline against an in-memory
//! network client.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use starknet_ops::account::Call;
use starknet_ops::command::{
	Command, CommandConfig, CommandError, ExecuteCommand, ExecutionContext, InputSource, RawInput,
	Target, Ux, Validation,
};
use starknet_ops::contracts::{CompiledContract, ContractError, ContractLoader, LoadedContract};
use starknet_ops::felt::{selector, Felt};
use starknet_ops::provider::{Provider, ProviderConfig, SubmissionError};
use starknet_ops::rpc::{
	CallRequest, DeployRequest, InvokeRequest, NetworkClient, NetworkError, SubmissionResult,
	TransactionStatus,
};
use starknet_ops::signer::{SignerError, Wallet};
use starknet_ops::transaction::{Confirmation, TxStatus};

// -- Test doubles --

struct MockClient {
	submission: SubmissionResult,
	multicall_error: Option<(&'static str, &'static str)>,
	poll_error: Option<&'static str>,
	/// While set, `poll_finality` never returns.
	stalled: AtomicBool,
	log: Mutex<Vec<&'static str>>,
	deployments: Mutex<Vec<DeployRequest>>,
	invocations: Mutex<Vec<InvokeRequest>>,
}

impl MockClient {
	fn new() -> Self {
		Self {
			submission: SubmissionResult {
				code: Some("TRANSACTION_RECEIVED".into()),
				transaction_hash: "0xabc".into(),
				address: Some("0xdef".into()),
			},
			multicall_error: None,
			poll_error: None,
			stalled: AtomicBool::new(false),
			log: Mutex::new(Vec::new()),
			deployments: Mutex::new(Vec::new()),
			invocations: Mutex::new(Vec::new()),
		}
	}

	fn calls(&self) -> Vec<&'static str> {
		self.log.lock().unwrap().clone()
	}

	fn count(&self, method: &str) -> usize {
		self.calls().iter().filter(|m| **m == method).count()
	}

	fn record(&self, method: &'static str) {
		self.log.lock().unwrap().push(method);
	}
}

#[async_trait::async_trait]
impl NetworkClient for MockClient {
	async fn submit_deployment(&self, request: &DeployRequest) -> Result<SubmissionResult, NetworkError> {
		self.record("submit_deployment");
		self.deployments.lock().unwrap().push(request.clone());
		Ok(self.submission.clone())
	}

	async fn submit_multicall(&self, request: &InvokeRequest) -> Result<SubmissionResult, NetworkError> {
		self.record("submit_multicall");
		if let Some((code, message)) = self.multicall_error {
			return Err(NetworkError::Gateway {
				code: code.into(),
				message: message.into(),
			});
		}
		self.invocations.lock().unwrap().push(request.clone());
		Ok(SubmissionResult {
			address: None,
			..self.submission.clone()
		})
	}

	async fn submit_raw(&self, _transaction: &Value) -> Result<SubmissionResult, NetworkError> {
		self.record("submit_raw");
		Ok(self.submission.clone())
	}

	async fn poll_finality(&self, _hash: &str) -> Result<(), NetworkError> {
		self.record("poll_finality");
		if self.stalled.load(Ordering::SeqCst) {
			std::future::pending::<()>().await;
		}
		match self.poll_error {
			Some(msg) => Err(NetworkError::Timeout(msg.into())),
			None => Ok(()),
		}
	}

	async fn get_status(&self, _hash: &str) -> Result<TransactionStatus, NetworkError> {
		self.record("get_status");
		let tx_status = if self.poll_error.is_some() { "REJECTED" } else { "ACCEPTED_ON_L2" };
		Ok(TransactionStatus {
			tx_status: tx_status.into(),
			block_hash: None,
			tx_failure_reason: None,
		})
	}

	async fn call(&self, request: &CallRequest) -> Result<Vec<Felt>, NetworkError> {
		self.record("call");
		assert_eq!(request.entry_point_selector, selector("get_nonce"));
		Ok(vec![Felt::from(3u8)])
	}
}

struct MockWallet {
	key: Felt,
	signed: AtomicUsize,
}

impl MockWallet {
	fn new() -> Arc<Self> {
		Arc::new(Self {
			key: Felt::from(0x1234u64),
			signed: AtomicUsize::new(0),
		})
	}
}

#[async_trait::async_trait]
impl Wallet for MockWallet {
	fn public_key(&self) -> &Felt {
		&self.key
	}

	async fn sign(&self, request: &InvokeRequest) -> Result<Vec<Felt>, SignerError> {
		assert!(request.signature.is_empty(), "wallet must see the unsigned request");
		self.signed.fetch_add(1, Ordering::SeqCst);
		Ok(vec![Felt::from(1u8), Felt::from(2u8)])
	}
}

struct StaticLoader {
	loads: AtomicUsize,
}

#[async_trait::async_trait]
impl ContractLoader for StaticLoader {
	async fn load(&self, address: Option<&Felt>) -> Result<LoadedContract, ContractError> {
		self.loads.fetch_add(1, Ordering::SeqCst);
		Ok(LoadedContract {
			address: address.cloned(),
			contract: balance_contract(),
		})
	}
}

fn balance_contract() -> CompiledContract {
	serde_json::from_value(json!({
		"abi": [
			{ "type": "function", "name": "increase_balance",
			  "inputs": [{ "name": "amount", "type": "felt" }], "outputs": [] }
		],
		"entry_points_by_type": { "CONSTRUCTOR": [], "EXTERNAL": [], "L1_HANDLER": [] },
		"program": { "data": ["0x1"] }
	}))
	.unwrap()
}

fn provider(client: &Arc<MockClient>) -> Provider {
	Provider::with_client(client.clone(), ProviderConfig::new("http://gateway.test"))
}

fn call(to: u64, entrypoint: &str, amount: u64) -> Call {
	Call {
		contract_address: Felt::from(to),
		entrypoint: entrypoint.into(),
		calldata: vec![Felt::from(amount)],
	}
}

// -- A pipeline command shaped like the catalog ones --

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
struct BalanceInput {
	balance: u64,
}

fn balance_command(
	function: Target,
	loader: Arc<StaticLoader>,
) -> ExecuteCommand<BalanceInput, [Felt; 1]> {
	ExecuteCommand::new(
		"test:balance",
		CommandConfig {
			ux: Ux {
				category: "test",
				function,
				examples: &[],
			},
			make_user_input: |raw| {
				Ok(BalanceInput {
					balance: raw.require("balance")?.parse()?,
				})
			},
			make_contract_input: |input| Ok([Felt::from(input.balance)]),
			validations: vec![
				Validation {
					name: "balance_is_positive",
					check: |input: &BalanceInput| input.balance > 0,
				},
				Validation {
					name: "balance_is_small",
					check: |input: &BalanceInput| input.balance < 1_000,
				},
			],
			load_contract: loader,
		},
	)
}

fn loader() -> Arc<StaticLoader> {
	Arc::new(StaticLoader {
		loads: AtomicUsize::new(0),
	})
}

// -- Provider: deployments --

#[tokio::test]
async fn awaited_deployment_exposes_hash_address_and_acceptance() {
	let client = Arc::new(MockClient::new());
	let provider = provider(&client);

	let mut handle = provider
		.deploy_contract(&balance_contract(), &[Felt::from(100u64)], true)
		.await
		.unwrap();

	assert_eq!(handle.hash(), "0xabc");
	assert_eq!(handle.address(), Some("0xdef"));
	assert_eq!(handle.status(), TxStatus::Accepted);
	assert_eq!(handle.wait().await, Confirmation { success: true });
	assert_eq!(handle.raw_status(), Some("ACCEPTED_ON_L2"));

	let deployments = client.deployments.lock().unwrap();
	assert_eq!(
		deployments[0].constructor_calldata,
		Some(vec![Felt::from(100u64)])
	);
}

#[tokio::test]
async fn empty_constructor_args_are_omitted() {
	let client = Arc::new(MockClient::new());
	provider(&client)
		.deploy_contract(&balance_contract(), &[], false)
		.await
		.unwrap();

	assert!(client.deployments.lock().unwrap()[0]
		.constructor_calldata
		.is_none());
}

#[tokio::test]
async fn unawaited_deployment_reaches_same_status_once_waited() {
	let client = Arc::new(MockClient::new());
	let provider = provider(&client);

	let awaited = provider
		.deploy_contract(&balance_contract(), &[], true)
		.await
		.unwrap();

	let mut deferred = provider
		.deploy_contract(&balance_contract(), &[], false)
		.await
		.unwrap();
	assert_eq!(deferred.status(), TxStatus::Pending);
	assert_eq!(client.count("poll_finality"), 1);

	deferred.wait().await;
	assert_eq!(deferred.status(), awaited.status());
	assert_eq!(client.count("poll_finality"), 2);
}

#[tokio::test]
async fn poll_failure_becomes_rejected_status() {
	let client = Arc::new(MockClient {
		poll_error: Some("x"),
		..MockClient::new()
	});

	let mut handle = provider(&client)
		.deploy_contract(&balance_contract(), &[], false)
		.await
		.unwrap();
	let confirmation = handle.wait().await;

	assert_eq!(confirmation, Confirmation { success: false });
	assert_eq!(handle.status(), TxStatus::Rejected);
	assert_eq!(handle.error_message(), Some("x"));
	// The raw status is fetched even on the failure branch.
	assert_eq!(handle.raw_status(), Some("REJECTED"));
}

#[tokio::test]
async fn second_wait_returns_cached_result_without_polling() {
	let client = Arc::new(MockClient {
		poll_error: Some("x"),
		..MockClient::new()
	});

	let mut handle = provider(&client)
		.deploy_contract(&balance_contract(), &[], false)
		.await
		.unwrap();
	let first = handle.wait().await;
	let second = handle.wait().await;

	assert_eq!(first, second);
	assert_eq!(handle.status(), TxStatus::Rejected);
	assert_eq!(client.count("poll_finality"), 1);
	assert_eq!(client.count("get_status"), 1);
}

#[tokio::test]
async fn expired_wait_leaves_handle_pending_until_a_later_wait() {
	let client = Arc::new(MockClient::new());
	client.stalled.store(true, Ordering::SeqCst);

	let mut handle = provider(&client)
		.deploy_contract(&balance_contract(), &[], false)
		.await
		.unwrap();

	assert_eq!(handle.wait_timeout(Duration::from_millis(50)).await, None);
	assert_eq!(handle.status(), TxStatus::Pending);
	assert!(handle.raw_status().is_none());

	client.stalled.store(false, Ordering::SeqCst);
	assert_eq!(handle.wait().await, Confirmation { success: true });
	assert_eq!(handle.status(), TxStatus::Accepted);
	assert_eq!(client.count("poll_finality"), 2);
}

// -- Provider: multicall --

#[tokio::test]
async fn empty_multicall_is_rejected_before_network() {
	let client = Arc::new(MockClient::new());
	let wallet = MockWallet::new();

	let err = provider(&client)
		.sign_and_send(&Felt::from(0x99u64), wallet.clone(), Vec::new(), false)
		.await
		.unwrap_err();

	assert!(matches!(err, SubmissionError::EmptyMulticall));
	assert!(client.calls().is_empty());
	assert_eq!(wallet.signed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn multicall_submission_error_surfaces_unmodified() {
	let client = Arc::new(MockClient {
		multicall_error: Some(("InsufficientBalance", "account cannot cover max_fee")),
		..MockClient::new()
	});

	let result = provider(&client)
		.sign_and_send(
			&Felt::from(0x99u64),
			MockWallet::new(),
			vec![call(0xa, "approve", 5), call(0xb, "deposit", 5)],
			true,
		)
		.await;

	match result {
		Err(SubmissionError::Network(NetworkError::Gateway { code, .. })) => {
			assert_eq!(code, "InsufficientBalance");
		}
		other => panic!("expected gateway error, got {other:?}"),
	}
	assert_eq!(client.count("poll_finality"), 0);
}

#[tokio::test]
async fn multicall_is_signed_and_not_awaited_by_default() {
	let client = Arc::new(MockClient::new());
	let wallet = MockWallet::new();

	let handle = provider(&client)
		.sign_and_send(
			&Felt::from(0x99u64),
			wallet.clone(),
			vec![call(0xa, "approve", 5), call(0xb, "deposit", 7)],
			false,
		)
		.await
		.unwrap();

	assert_eq!(handle.status(), TxStatus::Pending);
	assert!(handle.address().is_none());
	assert_eq!(wallet.signed.load(Ordering::SeqCst), 1);
	assert_eq!(client.calls(), vec!["call", "submit_multicall"]);

	let invocations = client.invocations.lock().unwrap();
	let invoke = &invocations[0];
	assert_eq!(invoke.contract_address, Felt::from(0x99u64));
	assert_eq!(invoke.entry_point_selector, selector("__execute__"));
	assert_eq!(invoke.signature, vec![Felt::from(1u8), Felt::from(2u8)]);
	assert_eq!(invoke.calldata.first(), Some(&Felt::from(2u8)));
	assert_eq!(invoke.calldata.last(), Some(&Felt::from(3u8)));
}

#[tokio::test]
async fn raw_send_returns_pending_handle() {
	let client = Arc::new(MockClient::new());
	let handle = provider(&client)
		.send(&json!({ "type": "INVOKE_FUNCTION" }))
		.await
		.unwrap();

	assert_eq!(handle.status(), TxStatus::Pending);
	assert_eq!(handle.raw().transaction_hash, "0xabc");
	assert_eq!(client.calls(), vec!["submit_raw"]);
}

// -- Pipeline --

#[tokio::test]
async fn failed_validation_never_touches_network_or_loader() {
	let client = Arc::new(MockClient::new());
	let loader = loader();
	let cmd = balance_command(Target::Function("increase_balance"), loader.clone());

	let mut ctx = ExecutionContext::new(provider(&client));
	ctx.account = Some(Felt::from(0x99u64));
	ctx.wallet = Some(MockWallet::new());
	ctx.contract_address = Some(Felt::from(0xdefu64));

	let err = cmd
		.execute(&ctx, InputSource::Prebuilt(BalanceInput { balance: 0 }))
		.await
		.unwrap_err();

	match err {
		CommandError::Validation { validation, .. } => assert_eq!(validation, "balance_is_positive"),
		other => panic!("expected validation error, got {other:?}"),
	}
	assert!(client.calls().is_empty());
	assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invoke_command_submits_through_account() {
	let client = Arc::new(MockClient::new());
	let cmd = balance_command(Target::Function("increase_balance"), loader());

	let mut ctx = ExecutionContext::new(provider(&client));
	ctx.account = Some(Felt::from(0x99u64));
	ctx.wallet = Some(MockWallet::new());
	ctx.contract_address = Some(Felt::from(0xdefu64));

	let handle = cmd
		.execute(&ctx, InputSource::Raw(RawInput::parse(["--balance=25"])))
		.await
		.unwrap();

	assert_eq!(handle.status(), TxStatus::Pending);
	assert_eq!(handle.address(), Some("0xdef"));

	let invocations = client.invocations.lock().unwrap();
	let calldata = &invocations[0].calldata;
	// 1 call: [len, to, selector, offset, data_len, calldata_len, amount, nonce]
	assert_eq!(calldata[1], Felt::from(0xdefu64));
	assert_eq!(calldata[2], selector("increase_balance"));
	assert_eq!(calldata[6], Felt::from(25u8));
}

#[tokio::test]
async fn pipeline_surfaces_submission_error_without_a_handle() {
	let client = Arc::new(MockClient {
		multicall_error: Some(("InsufficientBalance", "account cannot cover max_fee")),
		..MockClient::new()
	});
	let cmd = balance_command(Target::Function("increase_balance"), loader());

	let mut ctx = ExecutionContext::new(provider(&client));
	ctx.account = Some(Felt::from(0x99u64));
	ctx.wallet = Some(MockWallet::new());
	ctx.contract_address = Some(Felt::from(0xdefu64));
	ctx.wait = Some(true);

	let err = cmd
		.run(&ctx, RawInput::parse(["--balance=25"]))
		.await
		.unwrap_err();

	match err {
		CommandError::Submission(SubmissionError::Network(NetworkError::Gateway { code, .. })) => {
			assert_eq!(code, "InsufficientBalance");
		}
		other => panic!("expected gateway error, got {other:?}"),
	}
	assert_eq!(client.count("submit_multicall"), 1);
	assert_eq!(client.count("poll_finality"), 0);
}

#[tokio::test]
async fn invoke_without_account_fails_before_submission() {
	let client = Arc::new(MockClient::new());
	let cmd = balance_command(Target::Function("increase_balance"), loader());

	let mut ctx = ExecutionContext::new(provider(&client));
	ctx.contract_address = Some(Felt::from(0xdefu64));

	let err = cmd
		.execute(&ctx, InputSource::Prebuilt(BalanceInput { balance: 1 }))
		.await
		.unwrap_err();
	assert!(matches!(err, CommandError::MissingAccount));
	assert!(client.calls().is_empty());
}

#[tokio::test]
async fn constructor_command_deploys_and_waits_by_default() {
	let client = Arc::new(MockClient::new());
	let cmd = balance_command(Target::Constructor, loader());
	let ctx = ExecutionContext::new(provider(&client));

	let result = cmd
		.run(&ctx, RawInput::default().with_input(json!({ "balance": 10 })))
		.await
		.unwrap();

	assert_eq!(result.command, "test:balance");
	assert_eq!(result.responses.len(), 1);
	assert_eq!(result.responses[0].hash, "0xabc");
	assert_eq!(result.responses[0].address.as_deref(), Some("0xdef"));
	assert_eq!(result.responses[0].status, TxStatus::Accepted);
	assert_eq!(
		client.deployments.lock().unwrap()[0].constructor_calldata,
		Some(vec![Felt::from(10u8)])
	);
}

#[tokio::test]
async fn explicit_no_wait_leaves_deployment_pending() {
	let client = Arc::new(MockClient::new());
	let cmd = balance_command(Target::Constructor, loader());
	let mut ctx = ExecutionContext::new(provider(&client));
	ctx.wait = Some(false);

	let handle = cmd
		.execute(&ctx, InputSource::Prebuilt(BalanceInput { balance: 10 }))
		.await
		.unwrap();
	assert_eq!(handle.status(), TxStatus::Pending);
	assert_eq!(client.count("poll_finality"), 0);
}

#[tokio::test]
async fn malformed_prebuilt_input_is_a_transform_error() {
	let client = Arc::new(MockClient::new());
	let cmd = balance_command(Target::Constructor, loader());
	let ctx = ExecutionContext::new(provider(&client));

	let err = cmd
		.run(&ctx, RawInput::default().with_input(json!({ "balance": "lots" })))
		.await
		.unwrap_err();
	assert!(matches!(err, CommandError::Transform(_)));
	assert!(client.calls().is_empty());
}

#[tokio::test]
async fn independent_commands_share_one_provider() {
	let client = Arc::new(MockClient::new());
	let provider = provider(&client);
	let contract = balance_contract();
	let args = [Felt::from(1u8)];

	let (a, b) = tokio::join!(
		provider.deploy_contract(&contract, &[], true),
		provider.deploy_contract(&contract, &args, true),
	);

	assert_eq!(a.unwrap().status(), TxStatus::Accepted);
	assert_eq!(b.unwrap().status(), TxStatus::Accepted);
	assert_eq!(client.count("submit_deployment"), 2);
}
