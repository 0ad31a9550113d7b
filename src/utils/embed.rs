use poise::serenity_prelude::CreateEmbed;

pub const COLOR_SUCCESS: u32 = 0x2ECC71; // Green
pub const COLOR_ERROR: u32 = 0xE74C3C; // Red
pub const COLOR_WARNING: u32 = 0xF39C12; // Orange
pub const COLOR_LILAC: u32 = 0xC8A2C8;

pub fn success(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("✅ {}", title))
        .description(description)
        .color(COLOR_SUCCESS)
}

pub fn error(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("❌ {}", title))
        .description(description)
        .color(COLOR_ERROR)
}

pub fn warning(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("⚠️ {}", title))
        .description(description)
        .color(COLOR_WARNING)
}

pub fn info(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(COLOR_LILAC)
}
