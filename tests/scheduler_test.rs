mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ethers::signers::Signer;
use ethers::types::Address;
use tokio_util::sync::CancellationToken;

use common::{protocol_fixture, ConcurrencyProbe, MockRegistrar, VALID_KEY};
use phrs_register::{
    ClientFactory, NameStyle, ProxyEndpoint, RegistrarClient, RetryPolicy, TaskOutcome,
    TaskScheduler, WalletKey,
};

fn scheduler(max_concurrency: usize) -> TaskScheduler {
    TaskScheduler::new(
        protocol_fixture(Duration::from_millis(1)),
        RetryPolicy::default(),
        NameStyle::Random { length: 10 },
        max_concurrency,
    )
}

fn mock_factory() -> ClientFactory {
    Arc::new(|key, _proxy| {
        let owner = key.signer(1)?.address();
        Ok(Arc::new(MockRegistrar::with_owner(owner)) as Arc<dyn RegistrarClient>)
    })
}

#[tokio::test]
async fn wallets_are_assigned_round_robin() {
    let wallets: Vec<WalletKey> = [
        "1111111111111111111111111111111111111111111111111111111111111111",
        "2222222222222222222222222222222222222222222222222222222222222222",
        "3333333333333333333333333333333333333333333333333333333333333333",
    ]
    .iter()
    .map(|k| WalletKey::new(*k))
    .collect();
    let expected: Vec<Address> = wallets
        .iter()
        .map(|w| w.signer(1).unwrap().address())
        .collect();

    let reports = scheduler(4)
        .execute(&wallets, 7, &[], mock_factory(), CancellationToken::new())
        .await;

    assert_eq!(reports.len(), 7);
    for report in &reports {
        assert_eq!(report.outcome, TaskOutcome::Succeeded);
        assert_eq!(report.owner, Some(expected[report.index % wallets.len()]));
        // Freshly generated label per task, honoring the alphabet contract.
        assert_eq!(report.label.len(), 10);
        assert!(report
            .label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}

#[tokio::test]
async fn in_flight_tasks_never_exceed_the_bound() {
    let probe = Arc::new(ConcurrencyProbe::default());
    let probe_for_factory = Arc::clone(&probe);
    let factory: ClientFactory = Arc::new(move |key, _proxy| {
        let owner = key.signer(1)?.address();
        let mut mock = MockRegistrar::with_owner(owner);
        mock.work_delay = Duration::from_millis(10);
        mock.probe = Some(Arc::clone(&probe_for_factory));
        Ok(Arc::new(mock) as Arc<dyn RegistrarClient>)
    });

    let wallets = vec![WalletKey::new(VALID_KEY)];
    let reports = scheduler(2)
        .execute(&wallets, 8, &[], factory, CancellationToken::new())
        .await;

    assert_eq!(reports.len(), 8);
    assert!(reports.iter().all(|r| r.outcome == TaskOutcome::Succeeded));
    assert!(probe.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn every_task_draws_a_proxy_from_the_pool() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_factory = Arc::clone(&seen);
    let factory: ClientFactory = Arc::new(move |key, proxy| {
        seen_in_factory
            .lock()
            .unwrap()
            .push(proxy.map(|p| p.url.clone()));
        let owner = key.signer(1)?.address();
        Ok(Arc::new(MockRegistrar::with_owner(owner)) as Arc<dyn RegistrarClient>)
    });

    let proxies = vec![
        ProxyEndpoint {
            url: "http://10.0.0.1:8080".to_string(),
            username: None,
            password: None,
        },
        ProxyEndpoint {
            url: "http://10.0.0.2:8080".to_string(),
            username: None,
            password: None,
        },
    ];
    let wallets = vec![WalletKey::new(VALID_KEY)];

    let reports = scheduler(4)
        .execute(&wallets, 6, &proxies, factory, CancellationToken::new())
        .await;

    assert_eq!(reports.len(), 6);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 6);
    assert!(seen.iter().all(|p| p.is_some()));
}

#[tokio::test]
async fn invalid_wallets_do_not_poison_the_batch() {
    let wallets = vec![WalletKey::new(VALID_KEY), WalletKey::new("not-a-key")];

    let summary = scheduler(4)
        .run_all(&wallets, 4, &[], mock_factory(), CancellationToken::new())
        .await;

    // Tasks 0 and 2 use the valid wallet, 1 and 3 the invalid one.
    assert_eq!(summary.total(), 4);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 2);
}

#[tokio::test]
async fn empty_wallet_set_schedules_nothing() {
    let summary = scheduler(4)
        .run_all(&[], 4, &[], mock_factory(), CancellationToken::new())
        .await;
    assert_eq!(summary.total(), 0);
}
