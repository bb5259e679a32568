use anyhow::Result;
use sheet_scan_submit::{logger, App, Config};
use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var_os("SCAN_CONFIG") {
        Some(path) => Config::from_toml_file(&PathBuf::from(path))?,
        None => Config::from_env(),
    };

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
