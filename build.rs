fn main() {
    println!("cargo:rerun-if-env-changed=EFA_TELEGRAM_TOKEN");
    println!("cargo:rerun-if-env-changed=EFA_BOT_PASSWORD");
    println!("cargo:rerun-if-env-changed=EFA_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=EFA_WIFI_PASSWORD");

    // ESP-IDF link arguments are only needed for firmware images.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
