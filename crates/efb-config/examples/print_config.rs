/// Example program to print the loaded configuration
///
/// Run with: cargo run -p efb-config --example print_config

fn main() {
    // Load configuration from efb.toml
    let config = efb_config::EfbConfig::load();

    println!("=== EFB Browser Configuration ===\n");

    println!("Variant: {}", config.variant.as_deref().unwrap_or("generic"));
    println!();

    println!("Browser Settings:");
    println!("  Homepage: {}", config.browser.homepage);
    println!("  Audio Muted: {}", config.browser.audio_muted);
    println!("  Minimum Width: {}", config.browser.minimum_width);
    println!("  Scroll Speed: {}", config.browser.scroll_speed);
    println!("  Forced Language: {:?}", config.browser.forced_language);
    println!("  User Agent: {:?}", config.browser.user_agent);
    println!("  Hide Address Bar: {}", config.browser.hide_addressbar);
    println!("  Framerate: {}", config.browser.framerate);
    println!();

    match &config.panel {
        Some(panel) => {
            println!("Panel:");
            println!("  Origin: ({}, {})", panel.left, panel.bottom);
            println!("  Size: {}x{}", panel.width, panel.height);
            println!("  Fixed Aspect Ratio: {}", panel.fixed_aspect_ratio);
        }
        None => println!("Panel: <missing>"),
    }
    println!();

    println!("Bookmarks:");
    for bookmark in config.active_bookmarks() {
        println!("  [{}] {}", bookmark.icon, bookmark.url);
    }
    println!();

    // Try to serialize to TOML for verification
    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
