use anyhow::Result;
use tokenprobe_core::{Credentials, SessionFactory, SiteTargets};
use tokenprobe_pipeline::run_check;

pub async fn run_check_once(
    sessions: &dyn SessionFactory,
    site: &SiteTargets,
    username: String,
    password: String,
) -> Result<()> {
    let credentials = Credentials::new(username, password);
    let session = sessions.open()?;
    let summary = run_check(session.as_ref(), site, &credentials).await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
