use aging_collage::core::ConfigProvider;
use aging_collage::utils::{logger, validation::Validate};
use aging_collage::{AgingClient, Bot, BotConfig, CollageComposer, RequestOrchestrator, TelegramClient};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = BotConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting aging-bot");

    let layout = match config.resolve() {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!("❌ Failed to load overrides: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate().and_then(|_| layout.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if !std::path::Path::new(config.template_path()).exists() {
        tracing::warn!(
            "⚠️ Template {} does not exist yet, every request will fail until it does",
            config.template_path()
        );
    }

    let generator = Arc::new(AgingClient::from_config(&config)?);
    let composer = CollageComposer::new(config.template_path(), layout);
    let orchestrator = RequestOrchestrator::new(generator, composer, config.compose_workers());
    let telegram = Arc::new(TelegramClient::new(
        &config.telegram_api_base,
        &config.telegram_bot_key,
        config.poll_timeout(),
    )?);

    let bot = Bot::new(
        telegram,
        orchestrator,
        config.poll_timeout(),
        config.shutdown_grace(),
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("Could not listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl-C received");
    };

    match bot.run(shutdown).await {
        Ok(total) => {
            println!("✅ Stopped after generating {} collage(s)", total);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Bot stopped with error: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }
}
