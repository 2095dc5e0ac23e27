use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("scbi {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: scbi");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("SCBI_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "socketcan: {}",
        if cfg!(target_os = "linux") {
            "available"
        } else {
            "unavailable"
        }
    );
    println!("features: bridge={}, cli=true", cfg!(feature = "bridge"));

    Ok(SUCCESS)
}
