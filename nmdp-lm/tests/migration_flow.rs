//! End-to-end migration runs against a real database file
//!
//! Each test builds a legacy flat export in a temp directory, runs the
//! orchestrator over it, and inspects the target store plus the run
//! statistics.

use nmdp_lm::db;
use nmdp_lm::extract::FlatExportExtractor;
use nmdp_lm::models::RunState;
use nmdp_lm::MigrationOrchestrator;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    dir: TempDir,
    pool: SqlitePool,
}

impl TestEnv {
    async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = nmdp_common::db::init_database(&dir.path().join("nmdp.db"))
            .await
            .expect("init database");
        let env = Self { dir, pool };
        std::fs::create_dir_all(env.export_dir()).expect("create export dir");
        env
    }

    fn export_dir(&self) -> PathBuf {
        self.dir.path().join("legacy-export")
    }

    fn audit_dir(&self) -> PathBuf {
        self.dir.path().join("audit")
    }

    fn write_export(&self, name: &str, content: &str) {
        std::fs::write(self.export_dir().join(name), content).expect("write export");
    }

    fn orchestrator(&self) -> MigrationOrchestrator {
        MigrationOrchestrator::new(
            self.pool.clone(),
            FlatExportExtractor::new(self.export_dir()),
            None,
            self.audit_dir(),
        )
    }
}

#[tokio::test]
async fn single_account_creates_all_satellites() {
    let env = TestEnv::new().await;
    env.write_export(
        "accounts.csv",
        "email,first_name,last_name\nTest@Example.com,Jan,Kowalski\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.statistics.accounts.created, 1);
    assert_eq!(run.statistics.total_failed(), 0);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::accounts::count_accounts(&mut conn).await.unwrap(), 1);
    assert_eq!(db::patients::count_patients(&mut conn).await.unwrap(), 1);

    let (email, diet, contract, code, is_primary): (String, String, String, String, i64) =
        sqlx::query_as(
            r#"
            SELECT a.email, p.diet_status, p.contract_status, pr.referral_code, pp.is_primary
            FROM accounts a
            JOIN patients p ON p.account_guid = a.guid
            JOIN profiles pr ON pr.account_guid = a.guid
            JOIN person_profiles pp ON pp.account_guid = a.guid
            "#,
        )
        .fetch_one(&mut *conn)
        .await
        .expect("satellite join");

    assert_eq!(email, "test@example.com");
    assert_eq!(diet, "none");
    assert_eq!(contract, "none");
    assert_eq!(code.len(), 8);
    assert_eq!(is_primary, 1);

    // Credentials are never migrated: placeholder hash plus forced reset
    let (hash, must_reset): (String, i64) =
        sqlx::query_as("SELECT password_hash, must_reset_password FROM accounts")
            .fetch_one(&mut *conn)
            .await
            .expect("credential row");
    assert!(!hash.is_empty());
    assert_eq!(must_reset, 1);
}

#[tokio::test]
async fn reimporting_the_identical_export_creates_nothing() {
    let env = TestEnv::new().await;
    env.write_export(
        "accounts.csv",
        "email,first_name,last_name\nTest@Example.com,Jan,Kowalski\n",
    );

    let first = env.orchestrator().run().await;
    assert_eq!(first.statistics.accounts.created, 1);

    // Fresh orchestrator: the registry must rebuild from the store
    let second = env.orchestrator().run().await;
    assert_eq!(second.state, RunState::Completed);
    assert_eq!(second.statistics.total_created(), 0);
    assert_eq!(second.statistics.accounts.skipped_existing, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::accounts::count_accounts(&mut conn).await.unwrap(), 1);
}

#[tokio::test]
async fn identity_is_case_and_whitespace_insensitive() {
    let env = TestEnv::new().await;
    // The CSV reader trims whitespace; casing differences must collapse
    // inside the registry.
    env.write_export(
        "accounts.csv",
        "email\nA@B.com\na@B.COM\n   a@b.com\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.accounts.created, 1);
    assert_eq!(run.statistics.accounts.skipped_existing, 2);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::accounts::count_accounts(&mut conn).await.unwrap(), 1);
}

#[tokio::test]
async fn referral_with_unmigrated_side_is_skipped_not_created() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\nreferrer@x.com\n");
    env.write_export(
        "referrals.csv",
        "id,referrer_email,referred_email\n1,referrer@x.com,never-migrated@x.com\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.statistics.referrals.created, 0);
    assert_eq!(run.statistics.referrals.skipped_missing_reference, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::referrals::count_referrals(&mut conn).await.unwrap(), 0);
}

#[tokio::test]
async fn referral_names_fall_back_to_placeholders() {
    let env = TestEnv::new().await;
    // Neither account carries a name in the export
    env.write_export("accounts.csv", "email\nreferrer@x.com\nreferred@x.com\n");
    env.write_export(
        "referrals.csv",
        "id,referrer_email,referred_email\n1,referrer@x.com,referred@x.com\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.referrals.created, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    let (referrer_name, referred_name): (String, String) =
        sqlx::query_as("SELECT referrer_name, referred_name FROM referrals")
            .fetch_one(&mut *conn)
            .await
            .expect("referral row");
    assert_eq!(referrer_name, "Anonymous member");
    assert_eq!(referred_name, "New member");
}

#[tokio::test]
async fn legacy_field_representations_are_normalized() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\nanna@x.com\nben@x.com\n");
    // Localized affirmative token on the rewarded flag
    env.write_export(
        "referrals.csv",
        "id,referrer_email,referred_email,rewarded\n1,anna@x.com,ben@x.com,Tak\n",
    );
    // Delimited multi-value tags with blanks and stray whitespace
    env.write_export(
        "recommendations.csv",
        "id,patient_email,body,tags\n1,anna@x.com,eat more fiber,\"gluten, lactose , ,nuts\"\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.referrals.created, 1);
    assert_eq!(run.statistics.recommendations.created, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    let status: String = sqlx::query_scalar("SELECT status FROM referrals")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(status, "rewarded");

    let tags: String = sqlx::query_scalar("SELECT tags FROM recommendations")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    let tags: Vec<String> = serde_json::from_str(&tags).expect("tags json");
    assert_eq!(tags, vec!["gluten", "lactose", "nuts"]);
}

#[tokio::test]
async fn unresolvable_note_authors_share_one_system_account() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\npatient@x.com\n");
    env.write_export(
        "notes.csv",
        "id,patient_email,author_email,body\n\
         1,patient@x.com,ghost@x.com,first note\n\
         2,patient@x.com,ghost@x.com,second note\n\
         3,patient@x.com,other-ghost@x.com,third note\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.notes.created, 3);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::notes::count_notes(&mut conn).await.unwrap(), 3);
    // Patient account plus exactly one synthesized system account
    assert_eq!(db::accounts::count_accounts(&mut conn).await.unwrap(), 2);

    let system_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE email = 'system@nmdp.invalid'")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
    assert_eq!(system_count, 1);

    let distinct_authors: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT author_guid) FROM notes")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
    assert_eq!(distinct_authors, 1);
}

#[tokio::test]
async fn message_routes_through_legacy_chat_id() {
    let env = TestEnv::new().await;
    env.write_export(
        "accounts.csv",
        "email,chat_id\npatient@x.com,chat-9\n",
    );
    // No patient_email, unknown sender: both resolve through the chat id
    env.write_export(
        "messages.csv",
        "id,chat_id,sender_email,body\n1,chat-9,unknown@x.com,hello there\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.messages.created, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    let (sender_email, patient_email): (String, String) = sqlx::query_as(
        r#"
        SELECT sa.email, pa.email
        FROM messages m
        JOIN accounts sa ON sa.guid = m.sender_guid
        JOIN patients p ON p.guid = m.patient_guid
        JOIN accounts pa ON pa.guid = p.account_guid
        "#,
    )
    .fetch_one(&mut *conn)
    .await
    .expect("message joins");

    assert_eq!(sender_email, "patient@x.com");
    assert_eq!(patient_email, "patient@x.com");
}

#[tokio::test]
async fn empty_body_message_is_skipped() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\npatient@x.com\n");
    env.write_export(
        "messages.csv",
        "id,patient_email,body\n1,patient@x.com,\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.messages.created, 0);
    assert_eq!(run.statistics.messages.skipped_invalid, 1);
    assert_eq!(run.statistics.messages.failed, 0);
}

#[tokio::test]
async fn orphaned_recommendations_and_interviews_are_created() {
    let env = TestEnv::new().await;
    // No accounts at all: owners cannot resolve
    env.write_export(
        "recommendations.csv",
        "id,patient_email,body\n1,ghost@x.com,eat more fiber\n2,,less sugar\n",
    );
    env.write_export(
        "interviews.csv",
        "id,patient_email,answers\n1,ghost@x.com,\"{\"\"sleep\"\": \"\"poor\"\"}\"\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.statistics.recommendations.created, 2);
    assert_eq!(run.statistics.interviews.created, 1);
    assert_eq!(run.statistics.total_failed(), 0);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(
        db::recommendations::count_recommendations(&mut conn).await.unwrap(),
        2
    );
    assert_eq!(
        db::recommendations::count_orphaned(&mut conn).await.unwrap(),
        2
    );
    assert_eq!(db::interviews::count_interviews(&mut conn).await.unwrap(), 1);
    let orphan_interviews: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM interviews WHERE patient_guid IS NULL")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
    assert_eq!(orphan_interviews, 1);
}

#[tokio::test]
async fn shop_links_and_results_require_an_owner() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\npatient@x.com\n");
    env.write_export(
        "shop_links.csv",
        "id,patient_email,url\n1,patient@x.com,https://shop.example/p/1\n2,ghost@x.com,https://shop.example/p/2\n",
    );
    env.write_export(
        "results.csv",
        "id,patient_email,kind,value\n1,patient@x.com,glucose,5.2\n2,ghost@x.com,glucose,6.1\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.statistics.shop_links.created, 1);
    assert_eq!(run.statistics.shop_links.skipped_missing_reference, 1);
    assert_eq!(run.statistics.results.created, 1);
    assert_eq!(run.statistics.results.skipped_missing_reference, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::shop_links::count_shop_links(&mut conn).await.unwrap(), 1);
    assert_eq!(db::results::count_results(&mut conn).await.unwrap(), 1);
}

#[tokio::test]
async fn one_bad_record_does_not_disturb_the_rest() {
    let env = TestEnv::new().await;
    // Second account reuses the first one's chat id: a natural-key
    // collision that must fail that record alone.
    env.write_export(
        "accounts.csv",
        "email,chat_id\na@x.com,chat-1\nb@x.com,chat-1\nc@x.com,chat-2\n",
    );
    env.write_export(
        "notes.csv",
        "id,patient_email,author_email,body\n1,a@x.com,a@x.com,note a\n2,c@x.com,c@x.com,note c\n",
    );

    let run = env.orchestrator().run().await;
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.statistics.accounts.created, 2);
    assert_eq!(run.statistics.accounts.failed, 1);
    assert_eq!(run.statistics.notes.created, 2);
    assert_eq!(run.statistics.notes.failed, 0);

    // The failed record must leave no partial rows behind
    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::accounts::count_accounts(&mut conn).await.unwrap(), 2);
    assert_eq!(db::patients::count_patients(&mut conn).await.unwrap(), 2);
    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(profiles, 2);
}

#[tokio::test]
async fn full_rerun_is_idempotent_across_every_entity() {
    let env = TestEnv::new().await;
    env.write_export(
        "accounts.csv",
        "email,first_name,last_name,chat_id\nanna@x.com,Anna,Nowak,chat-1\nben@x.com,Ben,Adams,chat-2\n",
    );
    env.write_export(
        "referrals.csv",
        "id,referrer_email,referred_email\n1,anna@x.com,ben@x.com\n",
    );
    env.write_export(
        "notes.csv",
        "id,patient_email,author_email,body,created_at\n1,anna@x.com,ben@x.com,initial consult,2021-03-01 09:15:00\n",
    );
    env.write_export(
        "messages.csv",
        "id,chat_id,body,sent_at\n1,chat-1,hello,2021-03-02 10:00:00\n",
    );
    env.write_export(
        "shop_links.csv",
        "id,patient_email,url,label\n1,anna@x.com,https://shop.example/p/9,Vitamin D\n",
    );
    env.write_export(
        "recommendations.csv",
        "id,patient_email,title,body\n1,anna@x.com,Fiber,eat more fiber\n",
    );
    env.write_export(
        "results.csv",
        "id,patient_email,kind,value,measured_at\n1,anna@x.com,glucose,5.2,2021-02-28\n",
    );
    env.write_export(
        "interviews.csv",
        "id,patient_email,answers\n1,anna@x.com,\"{\"\"appetite\"\": \"\"low\"\"}\"\n",
    );

    let first = env.orchestrator().run().await;
    assert_eq!(first.state, RunState::Completed);
    assert_eq!(first.statistics.total_failed(), 0);
    assert_eq!(first.statistics.accounts.created, 2);
    assert_eq!(first.statistics.referrals.created, 1);
    assert_eq!(first.statistics.notes.created, 1);
    assert_eq!(first.statistics.messages.created, 1);
    assert_eq!(first.statistics.shop_links.created, 1);
    assert_eq!(first.statistics.recommendations.created, 1);
    assert_eq!(first.statistics.results.created, 1);
    assert_eq!(first.statistics.interviews.created, 1);

    let mut conn = env.pool.acquire().await.expect("acquire");
    assert_eq!(db::messages::count_messages(&mut conn).await.unwrap(), 1);
    drop(conn);

    let second = env.orchestrator().run().await;
    assert_eq!(second.state, RunState::Completed);
    assert_eq!(second.statistics.total_created(), 0);
    assert_eq!(second.statistics.accounts.skipped_existing, 2);
    assert_eq!(second.statistics.referrals.skipped_existing, 1);
    assert_eq!(second.statistics.notes.skipped_existing, 1);
    assert_eq!(second.statistics.messages.skipped_existing, 1);
    assert_eq!(second.statistics.shop_links.skipped_existing, 1);
    assert_eq!(second.statistics.recommendations.skipped_existing, 1);
    assert_eq!(second.statistics.results.skipped_existing, 1);
    assert_eq!(second.statistics.interviews.skipped_existing, 1);
}

#[tokio::test]
async fn audit_snapshot_lists_only_newly_registered_keys() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\nanna@x.com\n");

    let first = env.orchestrator().run().await;
    let first_snapshot = env
        .audit_dir()
        .join(format!("migration-audit-{}.json", first.run_id));
    let raw = std::fs::read_to_string(&first_snapshot).expect("first snapshot");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("parse snapshot");
    // Account plus the patient's two registry keys
    assert!(!value["entries"].as_array().unwrap().is_empty());

    let second = env.orchestrator().run().await;
    let second_snapshot = env
        .audit_dir()
        .join(format!("migration-audit-{}.json", second.run_id));
    let raw = std::fs::read_to_string(&second_snapshot).expect("second snapshot");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("parse snapshot");
    assert!(value["entries"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn run_record_is_persisted_with_statistics() {
    let env = TestEnv::new().await;
    env.write_export("accounts.csv", "email\nanna@x.com\n");

    let run = env.orchestrator().run().await;
    let loaded = db::runs::load_run(&env.pool, run.run_id)
        .await
        .expect("load run")
        .expect("run row present");

    assert_eq!(loaded.state, RunState::Completed);
    assert_eq!(loaded.statistics, run.statistics);
    assert!(loaded.ended_at.is_some());
}

#[tokio::test]
async fn missing_schema_aborts_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let export_dir = dir.path().join("legacy-export");
    std::fs::create_dir_all(&export_dir).expect("export dir");
    std::fs::write(export_dir.join("accounts.csv"), "email\nanna@x.com\n").expect("write");

    // connect_database performs no schema setup: the preload must fail
    let pool = nmdp_common::db::connect_database(&dir.path().join("empty.db"))
        .await
        .expect("connect");
    let orchestrator = MigrationOrchestrator::new(
        pool,
        FlatExportExtractor::new(&export_dir),
        None,
        dir.path().join("audit"),
    );

    let run = orchestrator.run().await;
    assert_eq!(run.state, RunState::Aborted);
    assert!(run.error.is_some());
    assert_eq!(run.statistics.total_created(), 0);
}

#[tokio::test]
async fn sources_missing_entirely_complete_with_empty_statistics() {
    let env = TestEnv::new().await;
    // Export directory exists but holds no files at all

    let run = env.orchestrator().run().await;
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.statistics.total_created(), 0);
    assert_eq!(run.statistics.total_failed(), 0);
}
