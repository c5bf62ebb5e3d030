use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    let (path, created) = Config::create_default_if_missing()?;

    if created {
        println!("Created {}", path.display());
        println!("Edit the [services] section to point at your backend.");
    } else {
        println!("{} already exists, leaving it alone.", path.display());
    }
    Ok(())
}
