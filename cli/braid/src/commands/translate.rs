//! `braid translate` — convert between foreign type spellings and host types.

use anyhow::{Context, Result};
use braid_core::HostType;
use braid_types::TypeTranslations;

/// Translate one type expression, or list the whole table when `expr` is `None`.
pub fn run(expr: Option<&str>, reverse: bool) -> Result<()> {
    let table = TypeTranslations::standard();
    match expr {
        Some(expr) => println!("{}", translate(&table, expr, reverse)?),
        None => {
            for (foreign, host) in table.pairs() {
                println!("  {foreign:<45} {host}");
            }
        }
    }
    Ok(())
}

fn translate(table: &TypeTranslations, expr: &str, reverse: bool) -> Result<String> {
    if reverse {
        let host = HostType::parse(expr).with_context(|| format!("parsing host type '{expr}'"))?;
        Ok(table.to_foreign(&host)?)
    } else {
        Ok(table.to_host(expr)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_both_directions() {
        let table = TypeTranslations::standard();
        assert_eq!(
            translate(&table, "pm::Matrix<pm::Rational>", false).unwrap(),
            "Matrix<Rational>"
        );
        assert_eq!(
            translate(&table, "Map<String,Int>", true).unwrap(),
            "pm::Map<std::string,long>"
        );
    }

    #[test]
    fn unknown_type_is_an_error() {
        let table = TypeTranslations::standard();
        assert!(translate(&table, "pm::Graph", false).is_err());
        assert!(translate(&table, "Array<", true).is_err());
    }

    #[test]
    fn listing_runs() {
        run(None, false).unwrap();
    }
}
