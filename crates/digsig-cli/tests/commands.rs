use chrono::{Duration, Utc};
use clap::Parser;
use digsig_cli::config::Config;
use digsig_cli::{run, Cli, CliError};
use digsig_orm::{Address, Customer, Deployment, LatestStats, Statistics};

struct Env {
    _dir: tempfile::TempDir,
    config: Config,
}

fn env() -> Env {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut config = Config::default();
    config.database.path = dir
        .path()
        .join("digsigdb.db")
        .to_str()
        .expect("temp path should be utf-8")
        .to_string();
    Env { _dir: dir, config }
}

fn invoke(env: &Env, args: &[&str]) -> (Result<i32, CliError>, String) {
    let cli = Cli::try_parse_from(std::iter::once("digsigdb").chain(args.iter().copied()))
        .expect("arguments should parse");
    let mut out = Vec::new();
    let result = run(&cli.command, &env.config, &mut out);
    (result, String::from_utf8(out).expect("output should be utf-8"))
}

fn connection(env: &Env) -> rusqlite::Connection {
    let conn = rusqlite::Connection::open(&env.config.database.path).expect("open db");
    digsig_db::configure_connection(&conn, &env.config.database.runtime_settings())
        .expect("configure db");
    conn
}

fn seed_deployment(env: &Env) -> i64 {
    invoke(env, &["migrate"]).0.expect("migrate");
    let conn = connection(env);
    let customer = Customer::add(&conn, "Bau und Wohnen eG").unwrap();
    let address = Address::add(&conn, "Bahnhofstr.", "8", "37073", "Göttingen").unwrap();
    Deployment::add(&conn, customer.id, address.id).unwrap().id
}

#[test]
fn migrate_is_idempotent() {
    let env = env();
    let (code, out) = invoke(&env, &["migrate"]);
    assert_eq!(code.unwrap(), 0);
    assert_eq!(out.trim(), "Applied 7 migration(s).");

    let (_, out) = invoke(&env, &["migrate"]);
    assert_eq!(out.trim(), "Applied 0 migration(s).");
}

#[test]
fn chkstats_reports_never_as_critical() {
    let env = env();
    let deployment = seed_deployment(&env);

    let (code, out) = invoke(&env, &["chkstats", &deployment.to_string()]);
    assert_eq!(code.unwrap(), 2);
    assert_eq!(out.trim(), "Never.");
}

#[test]
fn chkstats_uses_threshold_flags() {
    let env = env();
    let deployment = seed_deployment(&env);
    let sample = Statistics::add_at(
        &connection(&env),
        deployment,
        "menu.pdf",
        Utc::now() - Duration::days(3),
    )
    .unwrap();

    let id = deployment.to_string();
    let (code, out) = invoke(&env, &["chkstats", &id]);
    assert_eq!(code.unwrap(), 1);
    assert_eq!(out.trim(), sample.timestamp.to_rfc3339());

    let (code, _) = invoke(&env, &["chkstats", &id, "-w", "5", "-c", "10"]);
    assert_eq!(code.unwrap(), 0);

    let (code, _) = invoke(&env, &["chkstats", &id, "--warning", "1", "--critical", "2"]);
    assert_eq!(code.unwrap(), 2);
}

#[test]
fn refresh_stats_truncates_and_rebuilds() {
    let env = env();
    let deployment = seed_deployment(&env);
    {
        let conn = connection(&env);
        let now = Utc::now();
        Statistics::add_at(&conn, deployment, "old.pdf", now - Duration::days(40)).unwrap();
        Statistics::add_at(&conn, deployment, "new.pdf", now - Duration::days(1)).unwrap();
    }

    let (code, _) = invoke(&env, &["refresh-stats", "--truncate", "30"]);
    assert_eq!(code.unwrap(), 0);

    let conn = connection(&env);
    assert_eq!(digsig_orm::count::<Statistics>(&conn).unwrap(), 1);
    let latest = LatestStats::for_deployment(&conn, deployment)
        .unwrap()
        .expect("latest statistics pointer");
    assert_eq!(latest.sample(&conn).unwrap().document, "new.pdf");
}

#[test]
fn proxy_hosts_can_be_managed() {
    let env = env();

    assert_eq!(invoke(&env, &["proxy", "add", "b.example.com"]).0.unwrap(), 0);
    assert_eq!(invoke(&env, &["proxy", "add", "a.example.com"]).0.unwrap(), 0);

    let (_, out) = invoke(&env, &["proxy", "list"]);
    assert_eq!(out, "a.example.com\nb.example.com\n");

    let (code, _) = invoke(&env, &["proxy", "add", "a.example.com"]);
    match code {
        Err(CliError::Orm(err)) => assert!(err.is_constraint_violation()),
        other => panic!("expected constraint violation, got {other:?}"),
    }

    assert_eq!(invoke(&env, &["proxy", "remove", "a.example.com"]).0.unwrap(), 0);
    let (_, out) = invoke(&env, &["proxy", "list"]);
    assert_eq!(out, "b.example.com\n");

    let (code, _) = invoke(&env, &["proxy", "remove", "a.example.com"]);
    assert!(matches!(code, Err(CliError::UnknownHost(host)) if host == "a.example.com"));
}

#[test]
fn out_of_range_day_counts_are_rejected_by_the_parser() {
    for args in [
        ["digsigdb", "refresh-stats", "--truncate=-1"].as_slice(),
        ["digsigdb", "refresh-stats", "--truncate", "100000000"].as_slice(),
        ["digsigdb", "chkstats", "1", "-w", "9999999999999"].as_slice(),
        ["digsigdb", "chkstats", "1", "--critical=-3"].as_slice(),
    ] {
        let err = Cli::try_parse_from(args).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{args:?}");
    }
}

#[test]
fn invalid_configured_retention_keeps_statistics() {
    let mut env = env();
    let deployment = seed_deployment(&env);
    Statistics::add_at(
        &connection(&env),
        deployment,
        "fresh.pdf",
        Utc::now() - Duration::minutes(1),
    )
    .unwrap();

    env.config.statistics.retention_days = -1;
    let (code, _) = invoke(&env, &["refresh-stats"]);
    assert!(
        matches!(code, Err(CliError::Orm(digsig_orm::OrmError::InvalidDays(_)))),
        "unexpected result: {code:?}"
    );

    env.config.statistics.warning_days = 9_999_999_999_999;
    let (code, _) = invoke(&env, &["chkstats", &deployment.to_string()]);
    assert!(matches!(code, Err(CliError::Threshold(_))), "unexpected result: {code:?}");

    let conn = connection(&env);
    assert_eq!(digsig_orm::count::<Statistics>(&conn).unwrap(), 1);
}
