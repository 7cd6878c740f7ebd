//! Command dispatch against temporary stages and a recording elevation

use std::path::Path;

use locom::cli::{self, Context};
use locom::config::ConfigError;
use locom::network::{DockerCli, NetworkError};
use locom::CliError;
use locom_common::testing::{ElevatedCall, RecordingElevation};
use locom_common::{LoggingTransformer, Platform};
use locom_tls::certificate::MIN_KEY_BITS;
use locom_tls::{CertificateAuthorityBuilder, CertificateLayout, TlsError};

fn context(stage_dir: &Path, platform: Platform) -> Context<RecordingElevation> {
    let builder = CertificateAuthorityBuilder::new(CertificateLayout::in_stage(stage_dir))
        .ca_key_bits(MIN_KEY_BITS)
        .server_key_bits(MIN_KEY_BITS);
    Context::new(stage_dir.to_path_buf(), platform, RecordingElevation::new())
        .hosts_path(stage_dir.join("etc-hosts"))
        .builder(builder)
}

async fn run(ctx: &Context<RecordingElevation>, args: &[&str]) -> Result<String, CliError> {
    let mut out = Vec::new();
    let argv = std::iter::once("locom").chain(args.iter().copied());
    cli::run(argv, ctx, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

/// Temp dir with an initialized stage named `demo`
async fn demo_stage() -> (tempfile::TempDir, std::path::PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let stage = root.path().join("demo");
    locom::stage::init(&stage).await.unwrap();
    (root, stage)
}

#[tokio::test]
async fn test_version() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Platform::Linux);

    let out = run(&ctx, &["version"]).await.unwrap();
    assert_eq!(out, format!("locom version {}\n", env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_help_lists_commands_in_display_order() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Platform::Linux);

    let out = run(&ctx, &["help"]).await.unwrap();
    let position = |name: &str| out.find(&format!("\n  {name} ")).unwrap();
    assert!(position("help") < position("version"));
    assert!(position("version") < position("init"));
    assert!(position("init") < position("cert"));
    assert!(position("cert") < position("hosts"));
    assert!(position("hosts") < position("proxy"));
    assert!(position("proxy") < position("network"));

    let out = run(&ctx, &["help", "hosts"]).await.unwrap();
    assert!(out.contains("--verify"));
    assert!(out.contains("--remove"));
}

#[tokio::test]
async fn test_unknown_command_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Platform::Linux);

    let err = run(&ctx, &["deploy"]).await.unwrap_err();
    assert!(matches!(err, CliError::Usage(_)));
}

#[tokio::test]
async fn test_init_relative_folder() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Platform::Linux);

    let out = run(&ctx, &["init", "demo"]).await.unwrap();
    assert_eq!(out, "Initialized empty Locom stage in demo/.locom/\n");
    assert!(dir.path().join("demo/.locom/locom.yml").is_file());

    let err = run(&ctx, &["init", "demo"]).await.unwrap_err();
    assert!(matches!(err, CliError::Init(_)));
}

#[tokio::test]
async fn test_cert_setup_then_cleanup() {
    LoggingTransformer::init_test();
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::Linux);

    let out = run(&ctx, &["cert", "selfsigned", "setup"]).await.unwrap();
    assert!(out.starts_with("Generated local CA (SHA-1 "));
    assert!(out.contains("proxy/certs/server.fullchain.crt"));
    assert!(out.contains("proxy/config/tls-snippet.yml"));
    assert!(!out.contains("Warning"));

    let out = run(&ctx, &["cert", "selfsigned", "setup"]).await.unwrap();
    assert!(out.contains("Warning: replaced CA"));

    let out = run(&ctx, &["cert", "selfsigned", "cleanup"]).await.unwrap();
    assert_eq!(out.lines().count(), 6);
    assert!(!stage.join("proxy/certs/ca.crt").exists());

    let out = run(&ctx, &["cert", "selfsigned", "cleanup"]).await.unwrap();
    assert_eq!(out, "Nothing to remove\n");
    assert!(ctx.elevation.calls().is_empty());
}

#[tokio::test]
async fn test_trust_without_ca_spawns_nothing() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::MacOs);

    let err = run(&ctx, &["cert", "selfsigned", "trust"]).await.unwrap_err();
    assert!(matches!(err, CliError::Tls(TlsError::CaNotFound { .. })));
    assert!(ctx.elevation.calls().is_empty());
}

#[tokio::test]
async fn test_trust_and_untrust_on_keychain() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::MacOs);
    run(&ctx, &["cert", "selfsigned", "setup"]).await.unwrap();
    let ca_cert = stage.join("proxy/certs/ca.crt");
    let fingerprint = locom_tls::fingerprint(&ca_cert).await.unwrap();

    run(&ctx, &["cert", "selfsigned", "trust"]).await.unwrap();
    run(&ctx, &["cert", "selfsigned", "untrust"]).await.unwrap();

    let calls = ctx.elevation.calls();
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        ElevatedCall::Run { program, args } => {
            assert_eq!(program, "security");
            assert_eq!(args[0], "add-trusted-cert");
            assert_eq!(args.last().unwrap(), &ca_cert.display().to_string());
        }
        other => panic!("unexpected call {other:?}"),
    }
    match &calls[1] {
        ElevatedCall::Run { program, args } => {
            assert_eq!(program, "security");
            assert_eq!(args[0], "delete-certificate");
            assert_eq!(args[2], fingerprint);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_untrust_by_fingerprint_normalizes_it() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::Windows);
    let fingerprint = "ab:cd:ef:01:23:45:67:89:ab:cd:ef:01:23:45:67:89:ab:cd:ef:01";

    run(&ctx, &["cert", "selfsigned", "untrust", "--fingerprint", fingerprint])
        .await
        .unwrap();

    let calls = ctx.elevation.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ElevatedCall::Run { program, args } => {
            assert_eq!(program, "certutil");
            assert!(args.contains(&"ABCDEF0123456789ABCDEF0123456789ABCDEF01".to_string()));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn test_hosts_writes_block_and_state() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::Linux);
    std::fs::write(&ctx.hosts_path, "127.0.0.1 localhost\n").unwrap();

    let out = run(&ctx, &["hosts"]).await.unwrap();
    assert_eq!(out, "Hosts file updated with locom stage entries.\n");

    let block = "# >>> locom demo loopback apps >>>\n\
                 127.0.0.1 proxy.locom.self\n\
                 # <<< locom demo loopback apps <<<\n";
    assert_eq!(
        std::fs::read_to_string(&ctx.hosts_path).unwrap(),
        format!("127.0.0.1 localhost\n{block}")
    );
    assert_eq!(std::fs::read_to_string(stage.join(".locom/hosts")).unwrap(), block);

    run(&ctx, &["hosts"]).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&ctx.hosts_path).unwrap(),
        format!("127.0.0.1 localhost\n{block}")
    );

    let out = run(&ctx, &["hosts", "--remove"]).await.unwrap();
    assert_eq!(out, "Hosts file entries for demo removed.\n");
    assert_eq!(
        std::fs::read_to_string(&ctx.hosts_path).unwrap(),
        "127.0.0.1 localhost\n"
    );
    assert!(!stage.join(".locom/hosts").exists());
}

#[tokio::test]
async fn test_hosts_flags_conflict() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::Linux);

    let err = run(&ctx, &["hosts", "--verify", "--remove"]).await.unwrap_err();
    assert!(matches!(err, CliError::Usage(_)));
}

#[tokio::test]
async fn test_hosts_outside_a_stage() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), Platform::Linux);

    let err = run(&ctx, &["hosts"]).await.unwrap_err();
    assert!(matches!(err, CliError::Config(ConfigError::NotAStage)));
    assert_eq!(
        err.to_string(),
        "this folder does not contain locom stage configuration"
    );
    assert!(!ctx.hosts_path.exists());
}

#[tokio::test]
async fn test_hosts_rejects_incomplete_config() {
    let (_root, stage) = demo_stage().await;
    std::fs::write(
        stage.join(".locom/locom.yml"),
        "stage:\n  network:\n    bind:\n      address: 127.0.0.1\n",
    )
    .unwrap();
    let ctx = context(&stage, Platform::Linux);

    let err = run(&ctx, &["hosts"]).await.unwrap_err();
    assert!(matches!(err, CliError::Config(ConfigError::MissingField(_))));
}

#[tokio::test]
async fn test_proxy_writes_compose_files_once() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::Linux);

    let out = run(&ctx, &["proxy"]).await.unwrap();
    assert_eq!(out, "Created proxy/docker-compose.yml from template\n");

    let working = std::fs::read_to_string(stage.join("proxy/docker-compose.yml")).unwrap();
    assert!(working.contains("services:"));
    assert!(working.contains("traefik:v2.10"));
    assert!(working.contains("locom"));
    let reference = stage.join(".locom/proxy/docker-compose.yml");
    assert_eq!(std::fs::read_to_string(&reference).unwrap(), working);

    std::fs::write(stage.join("proxy/docker-compose.yml"), "# mine\n").unwrap();
    std::fs::remove_file(&reference).unwrap();
    let out = run(&ctx, &["proxy"]).await.unwrap();
    assert_eq!(out, "Skipped writing proxy/docker-compose.yml (already exists)\n");
    assert_eq!(
        std::fs::read_to_string(stage.join("proxy/docker-compose.yml")).unwrap(),
        "# mine\n"
    );
    assert!(reference.is_file());
}

#[tokio::test]
async fn test_proxy_uses_the_configured_network() {
    let (_root, stage) = demo_stage().await;
    std::fs::write(
        stage.join(".locom/locom.yml"),
        "stage:\n  network:\n    name: testnet\n",
    )
    .unwrap();
    let ctx = context(&stage, Platform::Linux);

    run(&ctx, &["proxy"]).await.unwrap();

    let compose = std::fs::read_to_string(stage.join("proxy/docker-compose.yml")).unwrap();
    assert!(compose.contains("services:"));
    assert!(compose.contains("traefik"));
    assert!(compose.contains("testnet"));
}

#[tokio::test]
async fn test_proxy_and_network_require_a_network_name() {
    let (_root, stage) = demo_stage().await;
    std::fs::write(
        stage.join(".locom/locom.yml"),
        "stage:\n  network:\n    bind:\n      address: 127.0.0.1\n",
    )
    .unwrap();
    let ctx = context(&stage, Platform::Linux).docker(DockerCli::new("locom-no-such-docker"));

    for command in ["proxy", "network"] {
        let err = run(&ctx, &[command]).await.unwrap_err();
        assert!(
            matches!(err, CliError::Config(ConfigError::MissingField("stage.network.name"))),
            "{command}: {err:?}"
        );
    }
    assert!(!stage.join("proxy").exists());
}

#[tokio::test]
async fn test_network_without_docker() {
    let (_root, stage) = demo_stage().await;
    let ctx = context(&stage, Platform::Linux).docker(DockerCli::new("locom-no-such-docker"));

    let err = run(&ctx, &["network"]).await.unwrap_err();
    assert!(matches!(err, CliError::Network(NetworkError::DockerMissing { .. })));
}

/// Docker stand-in: logs its arguments, fails `inspect` until `create` ran
#[cfg(unix)]
fn fake_docker(dir: &Path, create_fails: bool) -> (DockerCli, std::path::PathBuf) {
    let log = dir.join("docker.log");
    let marker = dir.join("docker-network-created");
    let create_exit = if create_fails { 1 } else { 0 };
    let script = format!(
        "echo \"$*\" >> '{log}'\n\
         if [ \"$2\" = inspect ]; then [ -f '{marker}' ] && exit 0; exit 1; fi\n\
         if [ \"$2\" = create ] && [ {create_exit} -eq 0 ]; then touch '{marker}'; fi\n\
         exit {create_exit}\n",
        log = log.display(),
        marker = marker.display(),
    );
    (DockerCli::new("sh").arg("-c").arg(script).arg("docker"), log)
}

#[cfg(unix)]
#[tokio::test]
async fn test_network_is_created_once() {
    let (root, stage) = demo_stage().await;
    let (docker, log) = fake_docker(root.path(), false);
    let ctx = context(&stage, Platform::Linux).docker(docker);

    let out = run(&ctx, &["network"]).await.unwrap();
    assert_eq!(
        out,
        "Ensuring Docker network \"locom\" exists...\n\
         Creating Docker network \"locom\"...\n\
         Network created successfully.\n"
    );

    let out = run(&ctx, &["network"]).await.unwrap();
    assert_eq!(
        out,
        "Ensuring Docker network \"locom\" exists...\nNetwork already exists.\n"
    );

    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "network inspect locom\nnetwork create locom\nnetwork inspect locom\n"
    );
    assert!(ctx.elevation.calls().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_network_create_failure_is_reported() {
    let (root, stage) = demo_stage().await;
    let (docker, _log) = fake_docker(root.path(), true);
    let ctx = context(&stage, Platform::Linux).docker(docker);

    let err = run(&ctx, &["network"]).await.unwrap_err();
    match err {
        CliError::Network(NetworkError::CreateFailed { name, .. }) => assert_eq!(name, "locom"),
        other => panic!("unexpected error: {other:?}"),
    }
}
