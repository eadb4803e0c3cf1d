//!
//! contactmgr server binary
//! ------------------------
//! Command-line entry point for the contact management server. Configuration
//! comes from `CONTACTS_*` environment variables; the flags below override them.

use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use contactmgr::config::ServerConfig;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    arg_value(args, flag).and_then(|v| v.parse::<u16>().ok())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).filter(|v| !v.starts_with("--")).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    let _ = fmt().with_env_filter(filter).try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("contactmgr\n\nUSAGE:\n  contactmgr [--http-port N] [--data-root PATH] [--manager-role NAME] [--admin-role NAME]\n\nOPTIONS:\n  --http-port N         HTTP API port (env: CONTACTS_HTTP_PORT, default 7878)\n  --data-root PATH      Folder for users.json and contacts.json (env: CONTACTS_DATA_ROOT, default data)\n  --admin-role NAME     Administrators role name (env: CONTACTS_ADMIN_ROLE)\n  --manager-role NAME   Managers role name (env: CONTACTS_MANAGER_ROLE)\n\nSeeding of the admin/manager accounts needs CONTACTS_SEED_USER_PW.\n");
        return Ok(());
    }

    // CLI arguments override environment
    let mut cfg = ServerConfig::from_env();
    if let Some(port) = parse_port_arg(&args, "--http-port") { cfg.http_port = port; }
    if let Some(root) = arg_value(&args, "--data-root") { cfg.data_root = PathBuf::from(root); }
    if let Some(name) = arg_value(&args, "--admin-role") { cfg.role_names.administrators = name; }
    if let Some(name) = arg_value(&args, "--manager-role") { cfg.role_names.managers = name; }

    info!(
        target: "startup",
        "contactmgr starting: RUST_LOG='{}', http_port={}, data_root='{}', seed_accounts={}",
        ServerConfig::rust_log(), cfg.http_port, cfg.data_root.display(), cfg.seed.user_password.is_some()
    );

    contactmgr::server::run(cfg).await
}
