use olevium_api::{Client, Request};
use olevium_auth::{Settings, resume_session};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::new()?;
    let client = Client::new(resume_session(&settings).await?);

    let req = Request::dashboard().summary(None);

    let summary = client.send(req).await?;
    println!("Balance: {}", summary.total_balance);
    Ok(())
}
