use liquida_core::error::LiquidaError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), LiquidaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
