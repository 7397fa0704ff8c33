//! NetCDF dataset inspection
//!
//! Printing a dataset's structure: dimensions, variables with their key
//! attributes, and global attributes.

use crate::errors::{GridBinError, Result};
use netcdf::{AttributeValue, File, Variable};

/// Prints dimensions, variables and global attributes of a dataset.
pub fn print_dataset(file: &File) -> Result<()> {
    println!("\n===== Dimensions =====");
    for dim in file.dimensions() {
        let unlimited = if dim.is_unlimited() { " (unlimited)" } else { "" };
        println!("- {}: {}{}", dim.name(), dim.len(), unlimited);
    }

    println!("\n===== Variables =====");
    for var in file.variables() {
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| format!("{}[{}]", d.name(), d.len()))
            .collect();
        println!("- {} ({})", var.name(), dims.join(", "));
    }

    println!("\n===== Global Attributes =====");
    for attr in file.attributes() {
        println!("- {}: {}", attr.name(), format_attribute(&attr.value()?));
    }

    Ok(())
}

/// Lists all variables and dimensions sorted by name.
pub fn list_variables_and_dimensions(file: &File) -> Result<()> {
    println!("\n Dimensions");
    println!("==============");

    let mut dimensions: Vec<_> = file.dimensions().collect();
    dimensions.sort_by(|a, b| a.name().cmp(&b.name()));

    if dimensions.is_empty() {
        println!("   (No dimensions found)");
    }
    for dim in dimensions {
        println!("    {} = {}", dim.name(), dimension_length(dim.len(), dim.is_unlimited()));
    }

    println!("\n Variables");
    println!("=============");

    let mut variables: Vec<_> = file.variables().collect();
    variables.sort_by(|a, b| a.name().cmp(&b.name()));

    if variables.is_empty() {
        println!("   (No variables found)");
    }
    for var in variables {
        let data_type = format!("{:?}", var.vartype()).to_lowercase();
        let (dims, shape) = dims_and_shape(&var);

        if dims.is_empty() {
            println!("    {} ({}): scalar", var.name(), data_type);
        } else {
            println!(
                "    {} ({}): [{}] = ({})",
                var.name(),
                data_type,
                dims.join(", "),
                shape
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" × ")
            );
        }

        let key_attrs: Vec<String> = ["units", "long_name", "_FillValue"]
            .iter()
            .filter_map(|name| {
                let value = var.attribute(name)?.value().ok()?;
                Some(format!("{}: {}", name, format_attribute(&value)))
            })
            .collect();
        if !key_attrs.is_empty() {
            println!("      └─ {}", key_attrs.join(", "));
        }
    }

    println!("\n💡 Tip: Use --bin <x>:<y>[:<z>] to bin variables into a raster");

    Ok(())
}

/// Describes a specific variable showing its data type, shape, and all attributes.
pub fn describe_variable(file: &File, var_name: &str) -> Result<()> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridBinError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    println!("\n Variable Description: {}", var_name);
    println!("={}", "=".repeat(var_name.len() + 25));

    let data_type = format!("{:?}", var.vartype()).to_lowercase();
    println!(" Data type: {}", data_type);

    let (dims, shape) = dims_and_shape(&var);
    if dims.is_empty() {
        println!(" Dimensions: (scalar)");
    } else {
        println!(" Dimensions: [{}]", dims.join(", "));
        println!("\n Dimension Details:");
        for dim in var.dimensions() {
            println!(
                "    {} = {}",
                dim.name(),
                dimension_length(dim.len(), dim.is_unlimited())
            );
        }
    }

    let attributes: Vec<_> = var.attributes().collect();
    if attributes.is_empty() {
        println!("\n  Attributes: (none)");
    } else {
        println!("\n  Attributes:");
        for attr in attributes {
            match attr.value() {
                Ok(value) => println!("   • {}: {}", attr.name(), format_attribute(&value)),
                Err(e) => println!("   • {}: (error reading value: {})", attr.name(), e),
            }
        }
    }

    let total_elements: usize = shape.iter().product();
    println!("\n Total elements: {}", total_elements);

    Ok(())
}

fn dims_and_shape(var: &Variable) -> (Vec<String>, Vec<usize>) {
    var.dimensions()
        .iter()
        .map(|d| (d.name().to_string(), d.len()))
        .unzip()
}

fn dimension_length(len: usize, unlimited: bool) -> String {
    if unlimited {
        format!("{} (unlimited)", len)
    } else {
        len.to_string()
    }
}

/// Human-readable attribute value; strings are quoted
#[must_use]
pub fn format_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => format!("\"{}\"", s),
        AttributeValue::Strs(ss) => format!("{:?}", ss),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::Floats(fs) => format!("{:?}", fs),
        AttributeValue::Double(d) => d.to_string(),
        AttributeValue::Doubles(ds) => format!("{:?}", ds),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Ints(is) => format!("{:?}", is),
        AttributeValue::Short(s) => s.to_string(),
        AttributeValue::Shorts(ss) => format!("{:?}", ss),
        other => format!("{:?}", other),
    }
}
