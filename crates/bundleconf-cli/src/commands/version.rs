use bundleconf_core::version::{version_string, SCHEMA_VERSION, VERSION};
use miette::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionJson {
    ok: bool,
    version: &'static str,
    schema_version: u32,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        return super::print_json(&VersionJson {
            ok: true,
            version: VERSION,
            schema_version: SCHEMA_VERSION,
        });
    }
    println!("{}", version_string());
    Ok(())
}
