use crate::cmd::CheckArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_schema, OutputFormat};

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let compiler = args.schema.compiler();
    let registry = args.schema.load(&compiler)?;
    print_schema(&registry.snapshot(), registry.generation(), format);
    Ok(SUCCESS)
}
