use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("eoinspect {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: eoinspect");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("EOINSPECT_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("EOINSPECT_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!(
        "schema_env: {}",
        std::env::var("EOINSPECT_SCHEMA").unwrap_or_else(|_| "unset".to_string())
    );

    Ok(SUCCESS)
}
