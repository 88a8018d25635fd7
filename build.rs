fn main() {
    // Build-time credentials are baked into `BridgeConfig::default()` via
    // `option_env!`, so a change must trigger a rebuild.
    for var in [
        "WIFI_SSID",
        "WIFI_PASS",
        "MQTT_HOST",
        "MQTT_PORT",
        "MQTT_USER",
        "MQTT_PASS",
        "MQTT_TOPIC",
        "MQTT_CLIENT_ID",
        "UPDATE_USER",
        "UPDATE_PASS",
        "BRIDGE_HOSTNAME",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
