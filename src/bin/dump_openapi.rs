use std::fs;

fn main() -> anyhow::Result<()> {
    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);

    let doc = thesis_portal::docs::build_openapi(port)?;
    let s = serde_json::to_string_pretty(&doc)?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/thesis-portal-openapi.json".to_string());
    fs::write(&path, s)?;
    println!("wrote {}", path);
    Ok(())
}
