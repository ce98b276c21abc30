use anyhow::Result;
use leadhub_infrastructure::ConfigService;

use crate::ConfigAction;

pub fn run(service: &ConfigService, action: &ConfigAction, api_url: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = service.effective(|key| std::env::var(key).ok(), api_url)?;
            println!("api_url      = {}", config.api_url);
            match config.timeout_secs {
                Some(secs) => println!("timeout_secs = {}", secs),
                None => println!("timeout_secs = (transport default)"),
            }
        }
        ConfigAction::SetUrl { url } => {
            let config = service.set_api_url(url)?;
            println!("✓ api_url set to {}", config.api_url);
        }
        ConfigAction::SetTimeout { seconds } => {
            let timeout = (*seconds > 0).then_some(*seconds);
            service.set_timeout(timeout)?;
            println!("✓ timeout updated");
        }
    }
    Ok(())
}
