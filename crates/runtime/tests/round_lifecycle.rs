//! Round lifecycle against the stub engine and in-memory storage.

use std::sync::Arc;
use std::time::Duration;

use runtime::{
    CreateRound, EngineHandle, FileRoundRepository, InMemoryRoundRepository, ProofGateway,
    ProofTarget, RepositoryError, RoundError, RoundRepository, RoundService, RuntimeConfig,
    Shout, UpdateOutcome, Whisper,
};
use word_core::{
    Identity, Prize, ProtocolConfig, Round, RoundNumber, ValidationError, encode_phrase,
};
use zk::{ProofData, StubEngine};

fn service_with(protocol: ProtocolConfig, config: RuntimeConfig) -> RoundService {
    service_on(protocol, config, Arc::new(InMemoryRoundRepository::new()))
}

fn service_on(
    protocol: ProtocolConfig,
    config: RuntimeConfig,
    repository: Arc<dyn RoundRepository>,
) -> RoundService {
    let engine = EngineHandle::ready(Arc::new(StubEngine::new(protocol.username_binding)));
    let gateway = ProofGateway::new(engine, Duration::from_secs(5), protocol.username_binding);
    RoundService::builder()
        .protocol(protocol)
        .config(config)
        .repository(repository)
        .gateway(gateway)
        .build()
        .expect("service should build")
}

fn unbound() -> RoundService {
    service_with(
        ProtocolConfig::default().with_username_binding(false),
        RuntimeConfig::default(),
    )
}

async fn create(service: &RoundService, phrase: &str, username: Option<&str>) -> RoundNumber {
    let (proof, commitment) = service.gateway().prove(phrase, username).await.unwrap();
    service
        .create_round(CreateRound {
            commitment,
            hint: "a classic password".to_string(),
            username: username.map(str::to_string),
            proof,
            prize: Prize(100),
            creator: None,
        })
        .await
        .unwrap()
        .round
}

async fn whisper(
    service: &RoundService,
    round: RoundNumber,
    phrase: &str,
    who: &str,
) -> runtime::Result<()> {
    let (proof, _) = service.gateway().prove(phrase, None).await.unwrap();
    service
        .whisper(Whisper {
            round,
            proof,
            identity: Identity::new(who),
            username: None,
        })
        .await
}

fn shout(round: RoundNumber, phrase: &str, who: &str) -> Shout {
    Shout {
        round,
        phrase: phrase.to_string(),
        identity: Identity::new(who),
    }
}

#[tokio::test]
async fn hunter2_round_from_creation_to_shout() {
    let elements = encode_phrase("hunter2").unwrap();
    let zeros = elements.iter().filter(|e| e.as_bytes() == &[0u8; 32]).count();
    assert_eq!(zeros, 5);
    assert_ne!(elements.iter().next().unwrap().as_bytes(), &[0u8; 32]);

    let service = unbound();
    let round = create(&service, "hunter2", None).await;
    assert_eq!(round, RoundNumber(1));

    let stored = service.get_round(round).await.unwrap();
    assert!(stored.active);
    assert!(stored.whisperers.is_empty());

    let err = service.shout(shout(round, "hunter3", "mallory")).await.unwrap_err();
    assert!(matches!(err, RoundError::InvalidSecret));
    assert!(service.get_round(round).await.unwrap().active);

    service.shout(shout(round, "hunter2", "alice")).await.unwrap();
    let closed = service.get_round(round).await.unwrap();
    assert!(!closed.active);
    assert_eq!(closed.phrase.as_deref(), Some("hunter2"));
    assert_eq!(closed.shouter, Some(Identity::new("alice")));
    assert!(closed.ended_at.is_some());

    let err = whisper(&service, round, "hunter2", "bob").await.unwrap_err();
    assert!(matches!(err, RoundError::RoundNotActive(_)));
    let err = service.shout(shout(round, "hunter2", "bob")).await.unwrap_err();
    assert!(matches!(err, RoundError::RoundNotActive(_)));
}

#[tokio::test]
async fn round_numbers_increase_from_one() {
    let service = unbound();
    assert_eq!(create(&service, "first", None).await, RoundNumber(1));
    assert_eq!(create(&service, "second", None).await, RoundNumber(2));

    let listed: Vec<_> = service
        .list_rounds()
        .await
        .unwrap()
        .into_iter()
        .map(|round| round.round)
        .collect();
    assert_eq!(listed, vec![RoundNumber(1), RoundNumber(2)]);
}

#[tokio::test]
async fn invalid_proof_creates_nothing() {
    let service = unbound();
    let (_, commitment) = service.gateway().prove("hunter2", None).await.unwrap();
    let (proof, _) = service.gateway().prove("hunter3", None).await.unwrap();

    let err = service
        .create_round(CreateRound {
            commitment,
            hint: "nope".to_string(),
            username: None,
            proof,
            prize: Prize::ZERO,
            creator: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoundError::InvalidProof));
    assert!(service.list_rounds().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_hint_is_rejected() {
    let service = unbound();
    let (proof, commitment) = service.gateway().prove("hunter2", None).await.unwrap();
    let err = service
        .create_round(CreateRound {
            commitment,
            hint: "   ".to_string(),
            username: None,
            proof,
            prize: Prize::ZERO,
            creator: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoundError::Validation(ValidationError::EmptyHint)));
}

#[tokio::test]
async fn creation_can_be_disabled() {
    let service = service_with(
        ProtocolConfig::default().with_username_binding(false),
        RuntimeConfig::default().with_creation_enabled(false),
    );
    let (proof, commitment) = service.gateway().prove("hunter2", None).await.unwrap();
    let err = service
        .create_round(CreateRound {
            commitment,
            hint: "hint".to_string(),
            username: None,
            proof,
            prize: Prize::ZERO,
            creator: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoundError::CreationDisabled));
}

#[tokio::test]
async fn double_whisper_is_rejected() {
    let service = unbound();
    let round = create(&service, "hunter2", None).await;

    whisper(&service, round, "hunter2", "alice").await.unwrap();
    let err = whisper(&service, round, "hunter2", "alice").await.unwrap_err();
    assert!(matches!(err, RoundError::AlreadyWhispered(_)));
    assert_eq!(service.get_round(round).await.unwrap().whisperers.len(), 1);
}

#[tokio::test]
async fn whisper_with_wrong_phrase_is_an_invalid_proof() {
    let service = unbound();
    let round = create(&service, "hunter2", None).await;

    let err = whisper(&service, round, "hunter3", "alice").await.unwrap_err();
    assert!(matches!(err, RoundError::InvalidProof));
    assert!(service.get_round(round).await.unwrap().whisperers.is_empty());
}

#[tokio::test]
async fn whisper_to_unknown_round_is_not_found() {
    let service = unbound();
    let err = whisper(&service, RoundNumber(9), "hunter2", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, RoundError::RoundNotFound(RoundNumber(9))));
}

#[tokio::test]
async fn concurrent_whispers_are_all_recorded() {
    let service = unbound();
    let round = create(&service, "hunter2", None).await;
    let (proof, _) = service.gateway().prove("hunter2", None).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        let proof: ProofData = proof.clone();
        tasks.push(tokio::spawn(async move {
            service
                .whisper(Whisper {
                    round,
                    proof,
                    identity: Identity::new(format!("user-{i}")),
                    username: None,
                })
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let whisperers = service.get_round(round).await.unwrap().whisperers;
    assert_eq!(whisperers.len(), 16);
    let mut unique = whisperers.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 16);
}

#[tokio::test]
async fn concurrent_shouts_have_one_winner() {
    let service = unbound();
    let round = create(&service, "hunter2", None).await;

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.shout(shout(round, "hunter2", "alice")).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.shout(shout(round, "hunter2", "bob")).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(RoundError::RoundNotActive(_))))
    );
}

#[tokio::test]
async fn fund_prize_adds_to_active_rounds_only() {
    let service = unbound();
    let round = create(&service, "hunter2", None).await;

    let total = service.fund_prize(round, Prize(50)).await.unwrap();
    assert_eq!(total, Prize(150));

    let err = service.fund_prize(round, Prize::ZERO).await.unwrap_err();
    assert!(matches!(err, RoundError::Validation(_)));

    service.shout(shout(round, "hunter2", "alice")).await.unwrap();
    let err = service.fund_prize(round, Prize(1)).await.unwrap_err();
    assert!(matches!(err, RoundError::RoundNotActive(_)));
}

#[tokio::test]
async fn check_proof_reports_shouted_rounds() {
    let service = unbound();
    let round = create(&service, "hunter2", None).await;
    let (proof, commitment) = service.gateway().prove("hunter2", None).await.unwrap();

    let check = service
        .check_proof(ProofTarget::Round(round), proof.clone(), None)
        .await
        .unwrap();
    assert!(check.ok);
    assert!(!check.shouted);

    service.shout(shout(round, "hunter2", "alice")).await.unwrap();
    let check = service
        .check_proof(ProofTarget::Commitment(commitment), proof, None)
        .await
        .unwrap();
    assert!(check.ok);
    assert!(check.shouted);

    let (wrong, _) = service.gateway().prove("hunter3", None).await.unwrap();
    let check = service
        .check_proof(ProofTarget::Round(round), wrong, None)
        .await
        .unwrap();
    assert!(!check.ok);
}

#[tokio::test]
async fn activity_and_sorting_follow_whispers() {
    let service = unbound();
    let first = create(&service, "hunter2", None).await;
    let second = create(&service, "swordfish", None).await;

    whisper(&service, first, "hunter2", "alice").await.unwrap();
    service.shout(shout(second, "swordfish", "alice")).await.unwrap();

    let alice = Identity::new("alice");
    let activity = service.user_activity(&alice).await.unwrap();
    assert_eq!(activity.whispered, vec![first]);
    assert_eq!(activity.shouted, vec![second]);

    let sorted = service.sorted_rounds(&alice).await.unwrap();
    assert_eq!(sorted.whispered.len(), 1);
    assert_eq!(sorted.whispered[0].round, first);
    assert_eq!(sorted.not_whispered.len(), 1);
    assert_eq!(sorted.not_whispered[0].round, second);
}

#[tokio::test]
async fn bound_round_accepts_whispers_from_every_player() {
    let service = service_with(ProtocolConfig::default(), RuntimeConfig::default());
    assert!(service.protocol().username_binding);
    let round = create(&service, "hunter2", Some("alice")).await;

    // Bob proves the same phrase under his own username.
    let (proof, commitment) = service.gateway().prove("hunter2", Some("bob")).await.unwrap();
    assert_eq!(commitment, service.get_round(round).await.unwrap().commitment);
    service
        .whisper(Whisper {
            round,
            proof: proof.clone(),
            identity: Identity::new("bob"),
            username: Some("bob".to_string()),
        })
        .await
        .unwrap();

    // The proof is bound to bob; it does not pass as carol's.
    let err = service
        .whisper(Whisper {
            round,
            proof,
            identity: Identity::new("carol"),
            username: Some("carol".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoundError::InvalidProof));

    let err = service
        .whisper(Whisper {
            round,
            proof: service.gateway().prove("hunter2", Some("carol")).await.unwrap().0,
            identity: Identity::new("carol"),
            username: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RoundError::Validation(ValidationError::MissingUsername)
    ));

    let whisperers = service.get_round(round).await.unwrap().whisperers;
    assert_eq!(whisperers, vec![Identity::new("bob")]);
}

#[tokio::test]
async fn bound_round_can_be_shouted_by_another_player() {
    let service = service_with(ProtocolConfig::default(), RuntimeConfig::default());
    let round = create(&service, "hunter2", Some("alice")).await;

    let err = service.shout(shout(round, "hunter3", "bob")).await.unwrap_err();
    assert!(matches!(err, RoundError::InvalidSecret));

    service.shout(shout(round, "hunter2", "bob")).await.unwrap();
    let closed = service.get_round(round).await.unwrap();
    assert_eq!(closed.shouter, Some(Identity::new("bob")));
}

#[tokio::test]
async fn rounds_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rounds.json");
    let protocol = ProtocolConfig::default().with_username_binding(false);

    {
        let repository = Arc::new(FileRoundRepository::open(&path).unwrap());
        let service = service_on(protocol, RuntimeConfig::default(), repository);
        create(&service, "hunter2", None).await;
        whisper(&service, RoundNumber(1), "hunter2", "alice")
            .await
            .unwrap();
    }

    let repository = Arc::new(FileRoundRepository::open(&path).unwrap());
    let service = service_on(protocol, RuntimeConfig::default(), repository);
    let round = service.get_round(RoundNumber(1)).await.unwrap();
    assert_eq!(round.whisperers, vec![Identity::new("alice")]);
    assert_eq!(create(&service, "swordfish", None).await, RoundNumber(2));
}

/// Listing blocks the calling thread until the test releases it.
struct GatedRepository {
    inner: InMemoryRoundRepository,
    gate: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
}

impl RoundRepository for GatedRepository {
    fn next_round_number(&self) -> Result<RoundNumber, RepositoryError> {
        self.inner.next_round_number()
    }

    fn insert(&self, round: &Round) -> Result<(), RepositoryError> {
        self.inner.insert(round)
    }

    fn load(&self, round: RoundNumber) -> Result<Option<Round>, RepositoryError> {
        self.inner.load(round)
    }

    fn list(&self) -> Result<Vec<Round>, RepositoryError> {
        let gate = self.gate.lock().unwrap();
        gate.recv_timeout(Duration::from_secs(5)).map_err(|_| {
            RepositoryError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "gate never opened",
            ))
        })?;
        self.inner.list()
    }

    fn append_whisperer(
        &self,
        round: RoundNumber,
        identity: &Identity,
    ) -> Result<UpdateOutcome, RepositoryError> {
        self.inner.append_whisperer(round, identity)
    }

    fn finalize(
        &self,
        round: RoundNumber,
        shouter: &Identity,
        phrase: &str,
    ) -> Result<UpdateOutcome, RepositoryError> {
        self.inner.finalize(round, shouter, phrase)
    }

    fn add_prize(&self, round: RoundNumber, amount: Prize) -> Result<UpdateOutcome, RepositoryError> {
        self.inner.add_prize(round, amount)
    }
}

// A single-threaded runtime can only open the gate if storage runs off the
// async worker.
#[tokio::test(flavor = "current_thread")]
async fn storage_does_not_block_the_async_worker() {
    let (open, gate) = std::sync::mpsc::channel();
    let repository = Arc::new(GatedRepository {
        inner: InMemoryRoundRepository::new(),
        gate: std::sync::Mutex::new(gate),
    });
    let service = service_on(
        ProtocolConfig::default().with_username_binding(false),
        RuntimeConfig::default(),
        repository,
    );

    let (listed, ()) = tokio::join!(service.list_rounds(), async {
        tokio::task::yield_now().await;
        open.send(()).unwrap();
    });
    assert!(listed.unwrap().is_empty());
}
