use counter_dapp::{
    binding::{SIMPLE_CONTRACT_ABI, SIMPLE_CONTRACT_NAME},
    ContractSchema,
};
use serde_json::{json, Value};

use crate::{cli::SchemaArgs, error::Result};

pub fn run(args: SchemaArgs) -> Result<()> {
    let schema = ContractSchema::from_abi_json(SIMPLE_CONTRACT_NAME, SIMPLE_CONTRACT_ABI)?;
    let parsed = describe(&schema)?;

    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("{}", serde_json::to_string(&parsed)?);
    }

    Ok(())
}

/// The interface as JSON, with each function's signature and selector.
fn describe(schema: &ContractSchema) -> Result<Value> {
    let functions = schema
        .iter_functions()
        .map(|function| -> Result<Value> {
            let mut entry = serde_json::to_value(function)?;
            if let Value::Object(fields) = &mut entry {
                fields.insert("signature".into(), json!(function.signature()));
                let selector = format!("0x{}", hex::encode(function.selector()));
                fields.insert("selector".into(), json!(selector));
            }
            Ok(entry)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "name": schema.name,
        "functions": functions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_counter_methods_with_selectors() {
        let schema = ContractSchema::from_abi_json(SIMPLE_CONTRACT_NAME, SIMPLE_CONTRACT_ABI)
            .expect("bundled interface");
        let described = describe(&schema).expect("describe");

        let functions = described["functions"].as_array().expect("functions");
        let names: Vec<_> = functions
            .iter()
            .filter_map(|f| f["name"].as_str())
            .collect();
        assert_eq!(names, ["count", "incrementCount", "setCount"]);

        assert_eq!(functions[0]["selector"], "0x06661abd");

        let set = &functions[2];
        assert_eq!(set["signature"], "setCount(uint256)");
        assert_eq!(set["stateMutability"], "nonpayable");
        assert!(set["selector"].as_str().is_some_and(|s| s.len() == 10));
    }
}
