use liquida_core::error::LiquidaError;
use liquida_core::settings::builtin;

pub fn list() -> Result<(), LiquidaError> {
    println!("Available detector presets:\n");
    for name in builtin::PRESETS {
        let preset = builtin::load_preset(name)?;
        println!("  {:<14} {}", name, preset.name);
        if let Some(ref desc) = preset.description {
            println!("  {:<14} {}", "", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), LiquidaError> {
    let preset = builtin::load_preset(preset)?;
    println!("{}", serde_json::to_string_pretty(&preset.settings)?);
    Ok(())
}
