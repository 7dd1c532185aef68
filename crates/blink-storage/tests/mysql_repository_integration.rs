use std::time::Duration;

use blink_core::{Clock, ManualClock, ShortCode, UrlMapping};
use blink_generator::RandomGenerator;
use blink_storage::{
    MySqlRepository, ReadRepository, Repository, StorageError, UniqueCodeExt,
    DEFAULT_MAX_ATTEMPTS,
};
use blink_test_infra::mysql::{MySqlServer, MysqlConfig};
use jiff::{SignedDuration, Timestamp};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    _mysql: MySqlServer,
    pool: sqlx::MySqlPool,
    repo: MySqlRepository,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        let repo = MySqlRepository::new(pool.clone());
        repo.ensure_schema().await.expect("create schema");

        Self {
            _mysql: mysql,
            pool,
            repo,
        }
    }

    /// A repository over the same database that reads time from `clock`.
    fn with_clock(&self, clock: ManualClock) -> MySqlRepository<ManualClock> {
        MySqlRepository::with_clock(self.pool.clone(), clock)
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn mapping(c: &str, url: &str, created_at: Timestamp, ttl_secs: i64) -> UrlMapping {
    UrlMapping::new(code(c), url, created_at, SignedDuration::from_secs(ttl_secs)).unwrap()
}

/// A mapping whose expiry is already in the past.
fn expired(c: &str, url: &str) -> UrlMapping {
    mapping(c, url, Timestamp::now() - SignedDuration::from_secs(60), 10)
}

#[tokio::test]
async fn save_and_find_live_mapping() {
    let fixture = Fixture::start().await;
    let saved = mapping("abc123", "https://example.com", Timestamp::now(), 120);

    fixture.repo.save(saved.clone()).await.unwrap();

    let by_code = fixture.repo.find_by_code(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(by_code.original_url, "https://example.com");
    assert_eq!(by_code.expire_at.as_second(), saved.expire_at.as_second());

    let by_url = fixture
        .repo
        .find_by_original_url("https://example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_url.short_code.as_str(), "abc123");
}

#[tokio::test]
async fn codes_are_case_sensitive() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .save(mapping("AbCdEf", "https://upper.example", Timestamp::now(), 120))
        .await
        .unwrap();
    fixture
        .repo
        .save(mapping("abcdef", "https://lower.example", Timestamp::now(), 120))
        .await
        .unwrap();

    let upper = fixture.repo.find_by_code(&code("AbCdEf")).await.unwrap().unwrap();
    assert_eq!(upper.original_url, "https://upper.example");
}

#[tokio::test]
async fn save_conflicts_when_code_is_live() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .save(mapping("abc123", "https://one.example", Timestamp::now(), 120))
        .await
        .unwrap();

    let err = fixture
        .repo
        .save(mapping("abc123", "https://two.example", Timestamp::now(), 120))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn expired_row_is_absent_before_purge() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .save(expired("old123", "https://example.com"))
        .await
        .unwrap();

    assert!(fixture.repo.find_by_code(&code("old123")).await.unwrap().is_none());
    assert!(fixture
        .repo
        .find_by_original_url("https://example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn save_reclaims_expired_code() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .save(expired("abc123", "https://old.example"))
        .await
        .unwrap();
    fixture
        .repo
        .save(mapping("abc123", "https://new.example", Timestamp::now(), 120))
        .await
        .unwrap();

    let got = fixture.repo.find_by_code(&code("abc123")).await.unwrap().unwrap();
    assert_eq!(got.original_url, "https://new.example");
}

#[tokio::test]
async fn purge_deletes_only_expired_rows() {
    let fixture = Fixture::start().await;

    fixture.repo.save(expired("gone01", "https://a.example")).await.unwrap();
    fixture.repo.save(expired("gone02", "https://b.example")).await.unwrap();
    fixture
        .repo
        .save(mapping("kept01", "https://c.example", Timestamp::now(), 600))
        .await
        .unwrap();

    assert_eq!(fixture.repo.purge_expired().await.unwrap(), 2);
    assert_eq!(fixture.repo.purge_expired().await.unwrap(), 0);
    assert!(fixture.repo.find_by_code(&code("kept01")).await.unwrap().is_some());
}

#[tokio::test]
async fn generates_a_free_code() {
    let fixture = Fixture::start().await;
    let generator = RandomGenerator::new(6).unwrap();

    let code = fixture
        .repo
        .generate_unique_code(&generator, DEFAULT_MAX_ATTEMPTS)
        .await
        .unwrap();
    assert_eq!(code.as_str().len(), 6);
}

#[tokio::test]
async fn one_second_ttl_is_visible_right_after_save() {
    let fixture = Fixture::start().await;
    // Just before a second boundary, where whole-second storage would
    // already consider a 1s mapping dead.
    let clock = ManualClock::new(Timestamp::from_millisecond(1_700_000_010_999).unwrap());
    let repo = fixture.with_clock(clock.clone());

    let saved = mapping("edge01", "https://example.com/edge", clock.now(), 1);
    repo.save(saved.clone()).await.unwrap();
    clock.advance(SignedDuration::from_millis(1));

    let got = repo.find_by_code(&code("edge01")).await.unwrap().unwrap();
    assert_eq!(got.created_at, saved.created_at);
    assert_eq!(got.expire_at, saved.expire_at);
    assert!(repo
        .find_by_original_url("https://example.com/edge")
        .await
        .unwrap()
        .is_some());

    clock.advance(SignedDuration::from_millis(999));
    assert!(repo.find_by_code(&code("edge01")).await.unwrap().is_none());
}

#[tokio::test]
async fn wall_clock_round_trip_with_one_second_ttl() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .save(mapping("now001", "https://example.com/now", Timestamp::now(), 1))
        .await
        .unwrap();

    assert!(fixture.repo.find_by_code(&code("now001")).await.unwrap().is_some());
}

#[tokio::test]
async fn expiry_follows_the_injected_clock() {
    let fixture = Fixture::start().await;
    let clock = ManualClock::new(Timestamp::now());
    let repo = fixture.with_clock(clock.clone());

    repo.save(mapping("clock1", "https://example.com/clock", clock.now(), 60))
        .await
        .unwrap();
    assert!(repo.find_by_code(&code("clock1")).await.unwrap().is_some());

    clock.advance(SignedDuration::from_secs(60));
    assert!(repo.find_by_code(&code("clock1")).await.unwrap().is_none());
    assert_eq!(repo.purge_expired().await.unwrap(), 1);
}
