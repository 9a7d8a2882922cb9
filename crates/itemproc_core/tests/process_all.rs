use itemproc_core::db::open_db_in_memory;
use itemproc_core::{
    CancellationToken, Item, ItemId, ItemRepository, ItemService, ItemStatus, ProcessingConfig,
    RepoError, RepoResult, SqliteItemRepository, WorkerPool,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Delegating repository with per-id fault injection.
struct FaultyRepo {
    inner: SqliteItemRepository,
    phantom_ids: Vec<ItemId>,
    conflict_on: HashSet<ItemId>,
    fail_on: HashSet<ItemId>,
    panic_on: HashSet<ItemId>,
}

impl FaultyRepo {
    fn new(inner: SqliteItemRepository) -> Self {
        Self {
            inner,
            phantom_ids: Vec::new(),
            conflict_on: HashSet::new(),
            fail_on: HashSet::new(),
            panic_on: HashSet::new(),
        }
    }
}

impl ItemRepository for FaultyRepo {
    fn list_items(&self) -> RepoResult<Vec<Item>> {
        self.inner.list_items()
    }

    fn list_processable_ids(&self) -> RepoResult<Vec<ItemId>> {
        let mut ids = self.inner.list_processable_ids()?;
        ids.extend(self.phantom_ids.iter().copied());
        Ok(ids)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        if self.panic_on.contains(&id) {
            panic!("storage driver crashed for {id}");
        }
        self.inner.get_item(id)
    }

    fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        self.inner.create_item(item)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        self.inner.update_item(item)
    }

    fn save_item(&self, item: &Item) -> RepoResult<Item> {
        if self.conflict_on.contains(&item.id) {
            return Err(RepoError::EmailConflict(item.email.clone()));
        }
        if self.fail_on.contains(&item.id) {
            return Err(RepoError::InvalidData("disk full".to_string()));
        }
        self.inner.save_item(item)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        self.inner.delete_item(id)
    }
}

fn seeded_repo(count: usize) -> (SqliteItemRepository, Vec<Item>) {
    let repo = SqliteItemRepository::new(open_db_in_memory().unwrap());
    let items = (0..count)
        .map(|i| {
            let item = Item::new(format!("item {i}"), format!("item{i}@example.com"))
                .with_description(format!("seeded item number {i}"));
            repo.create_item(&item).unwrap();
            item
        })
        .collect();
    (repo, items)
}

fn service<R: ItemRepository + 'static>(
    repo: R,
    capacity: usize,
    latency: Duration,
) -> ItemService<R> {
    let config = ProcessingConfig::new(capacity, latency).unwrap();
    ItemService::new(repo, WorkerPool::new(capacity), config)
}

fn ids_of(items: &[Item]) -> HashSet<ItemId> {
    items.iter().map(|item| item.id).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn all_resolvable_items_are_processed() {
    let (repo, seeded) = seeded_repo(6);
    let service = service(repo, 10, Duration::from_millis(5));

    let processed = service.process_all().await.unwrap();

    assert_eq!(processed.len(), 6);
    assert_eq!(ids_of(&processed), ids_of(&seeded));
    assert!(processed
        .iter()
        .all(|item| item.status == ItemStatus::Processed));
    for item in service.find_all().unwrap() {
        assert_eq!(item.status, ItemStatus::Processed);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_store_yields_empty_batch() {
    let (repo, _) = seeded_repo(0);
    let service = service(repo, 10, Duration::from_millis(5));

    let report = service
        .process_all_with_report(&CancellationToken::new())
        .await
        .unwrap();

    assert!(report.items.is_empty());
    assert_eq!(report.stats.requested, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn vanished_item_is_skipped_without_error() {
    let (inner, seeded) = seeded_repo(4);
    let mut repo = FaultyRepo::new(inner);
    repo.phantom_ids.push(Uuid::new_v4());
    let service = service(repo, 10, Duration::from_millis(5));

    let report = service
        .process_all_with_report(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.requested, 5);
    assert_eq!(report.stats.not_found, 1);
    assert_eq!(report.items.len(), 4);
    assert_eq!(ids_of(&report.items), ids_of(&seeded));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn persistence_conflict_is_isolated_to_its_item() {
    let (inner, seeded) = seeded_repo(5);
    let conflicting = seeded[2].id;
    let mut repo = FaultyRepo::new(inner);
    repo.conflict_on.insert(conflicting);
    let service = service(repo, 10, Duration::from_millis(5));

    let report = service
        .process_all_with_report(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.conflicts, 1);
    assert_eq!(report.items.len(), 4);
    let processed = ids_of(&report.items);
    assert!(!processed.contains(&conflicting));
    for item in seeded.iter().filter(|item| item.id != conflicting) {
        assert!(processed.contains(&item.id));
    }
    let untouched = service.find_by_id(conflicting).unwrap().unwrap();
    assert_eq!(untouched.status, ItemStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn storage_failure_and_panic_are_counted_as_failed() {
    let (inner, seeded) = seeded_repo(4);
    let mut repo = FaultyRepo::new(inner);
    repo.fail_on.insert(seeded[0].id);
    repo.panic_on.insert(seeded[1].id);
    let service = service(repo, 10, Duration::from_millis(5));

    let report = service
        .process_all_with_report(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.failed, 2);
    assert_eq!(report.stats.processed, 2);
    assert_eq!(report.stats.finished(), report.stats.requested);
    assert_eq!(ids_of(&report.items), ids_of(&seeded[2..]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sequential_invocations_do_not_share_results() {
    let (repo, seeded) = seeded_repo(3);
    let service = service(repo, 10, Duration::from_millis(5));

    let first = service.process_all().await.unwrap();
    assert_eq!(ids_of(&first), ids_of(&seeded));

    service.delete_by_id(seeded[0].id).unwrap();
    service.delete_by_id(seeded[1].id).unwrap();
    let late = service
        .create(&Item::new("late arrival", "late@example.com"))
        .unwrap();

    let second = service.process_all().await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(ids_of(&second), HashSet::from([seeded[2].id, late.id]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn many_concurrent_workers_lose_no_results() {
    let (repo, seeded) = seeded_repo(120);
    let service = service(repo, 32, Duration::from_millis(1));

    let processed = service.process_all().await.unwrap();

    assert_eq!(processed.len(), 120);
    assert_eq!(ids_of(&processed), ids_of(&seeded));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn work_beyond_capacity_queues_until_slots_free() {
    let latency = Duration::from_millis(40);
    let (repo, _) = seeded_repo(25);
    let pool = WorkerPool::new(10);
    let config = ProcessingConfig::new(10, latency).unwrap();
    let service = ItemService::new(repo, pool.clone(), config);

    let started_at = Instant::now();
    let processed = service.process_all().await.unwrap();
    let elapsed = started_at.elapsed();

    assert_eq!(processed.len(), 25);
    // 25 workers through 10 slots need at least three latency waves.
    assert!(
        elapsed >= latency * 3,
        "batch finished in {elapsed:?}, faster than three waves"
    );
    assert_eq!(pool.available(), pool.capacity());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_batch_returns_nothing_and_writes_nothing() {
    let (repo, seeded) = seeded_repo(5);
    let service = service(repo, 2, Duration::from_secs(30));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = service.process_all_with_report(&cancel).await.unwrap();

    assert!(report.items.is_empty());
    assert_eq!(report.stats.cancelled, seeded.len());
    for item in service.find_all().unwrap() {
        assert_eq!(item.status, ItemStatus::Pending);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_mid_delay_releases_the_barrier() {
    let (repo, _) = seeded_repo(4);
    let service = service(repo, 2, Duration::from_secs(30));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        service.process_all_with_report(&cancel),
    )
    .await
    .expect("barrier should release once workers observe cancellation")
    .unwrap();

    assert!(report.items.is_empty());
    assert_eq!(report.stats.cancelled, 4);
}
