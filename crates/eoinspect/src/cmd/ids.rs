use eoinspect_codec::{PacketAction, PacketFamily};

use crate::cmd::IdsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_taxonomy, OutputFormat, TaxonomyEntry};

pub fn run(args: IdsArgs, format: OutputFormat) -> CliResult<i32> {
    print_taxonomy(&entries(&args), format);
    Ok(SUCCESS)
}

fn entries(args: &IdsArgs) -> Vec<TaxonomyEntry> {
    let both = !args.families && !args.actions;
    let mut entries = Vec::new();

    if both || args.families {
        entries.extend(PacketFamily::ALL.iter().map(|family| TaxonomyEntry {
            kind: "family",
            name: family.name(),
            byte: family.to_byte(),
        }));
    }
    if both || args.actions {
        entries.extend(PacketAction::ALL.iter().map(|action| TaxonomyEntry {
            kind: "action",
            name: action.name(),
            byte: action.to_byte(),
        }));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_tables() {
        let all = entries(&IdsArgs {
            families: false,
            actions: false,
        });
        assert_eq!(all.len(), PacketFamily::ALL.len() + PacketAction::ALL.len());

        let families = entries(&IdsArgs {
            families: true,
            actions: false,
        });
        assert!(families.iter().all(|entry| entry.kind == "family"));
        assert_eq!(families.last().map(|entry| entry.byte), Some(255));
    }
}
