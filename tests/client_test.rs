// Control-surface tests against a wiremock device.
#![allow(clippy::unwrap_used)]

mod common;

use common::{device_requests, setup, status, xml};
use pretty_assertions::assert_eq;
use soundtouch_api::{
    nodes, AddStation, AudioProductLevelControls, CecHdmiMode, ContentItem, Navigate,
    NotificationOptions, Preset, PresetList, ProductCecHdmiControl, RemoveStation, SimpleConfig,
    SoundTouchDevice, SoundTouchError, Volume, Zone, ZoneMember,
};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const NO_DELAY: Option<Duration> = Some(Duration::ZERO);

const VOLUME: &str = r#"<volume deviceID="AAA"><targetvolume>25</targetvolume><actualvolume>25</actualvolume><muteenabled>false</muteenabled></volume>"#;

fn tunein_item() -> ContentItem {
    ContentItem {
        source: Some("TUNEIN".to_string()),
        item_type: Some("stationurl".to_string()),
        location: Some("/v1/playback/station/s33828".to_string()),
        is_presetable: true,
        name: Some("K-LOVE Radio".to_string()),
        ..Default::default()
    }
}

// ── Pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unsupported_endpoint_sends_nothing() {
    let (server, client) = setup(&["info", "volume"]).await;

    let err = client.get(nodes::BASS).await.unwrap_err();
    assert!(matches!(err, SoundTouchError::NotCapable { ref endpoint, .. } if endpoint == "bass"));
    assert_eq!(err.status_code(), Some(400));

    let err = client.set_bass_level(5).await.unwrap_err();
    assert!(matches!(err, SoundTouchError::NotCapable { .. }));

    let err = client.get_audio_dsp_controls(true).await.unwrap_err();
    assert!(matches!(
        err,
        SoundTouchError::NotCapable { ref endpoint, .. } if endpoint == "audiodspcontrols"
    ));

    assert!(device_requests(&server).await.is_empty());
}

#[tokio::test]
async fn test_event_endpoint_returns_empty_message() {
    let (server, client) = setup(&["info", "volume"]).await;

    let message = client.get(nodes::VOLUME_UPDATED).await.unwrap();
    assert!(message.is_empty());
    assert!(device_requests(&server).await.is_empty());
}

#[tokio::test]
async fn test_error_envelopes_raise() {
    let (server, client) = setup(&["info", "volume", "bass"]).await;

    Mock::given(method("GET"))
        .and(path("/volume"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"<errors deviceID="AAA"><error value="401" name="HTTP_STATUS_UNAUTHORIZED" severity="Unknown">unauthorized</error></errors>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bass"))
        .respond_with(xml(
            r#"<Error value="1005" name="UNKNOWN_ERROR" severity="Unknown">bad request</Error>"#,
        ))
        .mount(&server)
        .await;

    let err = client.get_volume(true).await.unwrap_err();
    let envelope = err.envelope().unwrap();
    assert_eq!(envelope.code, 401);
    assert_eq!(envelope.name, "HTTP_STATUS_UNAUTHORIZED");
    assert_eq!(envelope.message, "unauthorized");

    let err = client.get(nodes::BASS).await.unwrap_err();
    assert_eq!(err.status_code(), Some(1005));
    assert!(client.cached::<Volume>(nodes::VOLUME).is_none());
}

#[tokio::test]
async fn test_error_envelope_attached_when_not_raising() {
    let (server, client) = setup(&["info", "volume"]).await;
    let client = client.with_raise_errors(false);

    Mock::given(method("GET"))
        .and(path("/volume"))
        .respond_with(xml(
            r#"<Error value="1005" name="UNKNOWN_ERROR" severity="Unknown">bad request</Error>"#,
        ))
        .mount(&server)
        .await;

    let message = client.get(nodes::VOLUME).await.unwrap();
    assert!(message.has_error());
    assert_eq!(message.error().unwrap().name, "UNKNOWN_ERROR");

    // typed accessors still refuse to build a value from an error body
    assert!(matches!(
        client.get_volume(true).await,
        Err(SoundTouchError::Device(_))
    ));
}

#[tokio::test]
async fn test_options_reads_allow_header() {
    let (server, client) = setup(&["info", "volume"]).await;

    Mock::given(method("OPTIONS"))
        .and(path("/volume"))
        .respond_with(ResponseTemplate::new(200).insert_header("Allow", "GET, POST"))
        .mount(&server)
        .await;

    assert_eq!(client.get_options(nodes::VOLUME).await.unwrap(), ["GET", "POST"]);
    assert!(client.options(nodes::BASS).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_host_rejected_before_io() {
    let err = SoundTouchDevice::connect("soundtouch.local").await.unwrap_err();
    assert!(matches!(err, SoundTouchError::InvalidHost(host) if host == "soundtouch.local"));
}

// ── Cache ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cached_volume_tracks_set_volume() {
    let (server, client) = setup(&["info", "volume"]).await;

    Mock::given(method("GET"))
        .and(path("/volume"))
        .respond_with(xml(VOLUME))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/volume"))
        .respond_with(status("volume"))
        .mount(&server)
        .await;

    assert_eq!(client.get_volume(true).await.unwrap().actual, 25);
    assert_eq!(client.get_volume(false).await.unwrap().actual, 25);

    client.set_volume_level(140).await.unwrap();
    let cached: Volume = client.cached(nodes::VOLUME).unwrap();
    assert_eq!(cached.actual, 100);
    assert_eq!(cached.target, 100);

    let requests = device_requests(&server).await;
    assert_eq!(requests.last().unwrap().2, "<volume>100</volume>");
}

#[tokio::test]
async fn test_set_name_updates_device_and_cache() {
    let (server, client) = setup(&["info", "name"]).await;

    Mock::given(method("POST"))
        .and(path("/name"))
        .respond_with(xml(r#"<info deviceID="AAA"><name>Kitchen</name></info>"#))
        .mount(&server)
        .await;

    client.set_name("Kitchen").await.unwrap();

    assert_eq!(client.device().device_name(), "Kitchen");
    let cached: SimpleConfig = client.cached(nodes::NAME).unwrap();
    assert_eq!(cached.value.as_deref(), Some("Kitchen"));
    assert_eq!(device_requests(&server).await[0].2, "<name>Kitchen</name>");
}

#[tokio::test]
async fn test_store_preset_caches_stored_slot() {
    let (server, client) = setup(&["info", "storePreset", "presets"]).await;

    // device echoes a stale list without the new content
    Mock::given(method("POST"))
        .and(path("/storePreset"))
        .respond_with(xml(
            r#"<presets><preset id="1" createdOn="1" updatedOn="1"><ContentItem source="AUX" location="AUX" isPresetable="true"><itemName>AUX IN</itemName></ContentItem></preset><preset id="2" createdOn="5" updatedOn="5"><ContentItem source="BLUETOOTH"><itemName>Phone</itemName></ContentItem></preset></presets>"#,
        ))
        .mount(&server)
        .await;

    let preset = Preset {
        preset_id: 1,
        content_item: tunein_item(),
        ..Default::default()
    };
    let presets = client.store_preset(&preset).await.unwrap();

    let stored = presets.get(1).unwrap();
    assert_eq!(stored.content_item.name.as_deref(), Some("K-LOVE Radio"));
    assert!(stored.created_on > 0);
    assert_eq!(presets.presets.len(), 2);

    let cached: PresetList = client.cached(nodes::PRESETS).unwrap();
    assert_eq!(cached, presets);

    let body = &device_requests(&server).await[0].2;
    assert!(body.starts_with(r#"<preset id="1" createdOn=""#));
    assert!(body.contains(r#"location="/v1/playback/station/s33828""#));
}

// ── Device settings ─────────────────────────────────────────────────

#[tokio::test]
async fn test_settings_accessors_parse_and_cache() {
    let urls = ["info", "bluetoothInfo", "networkInfo", "systemtimeout", "listMediaServers"];
    let (server, client) = setup(&urls).await;

    let documents = [
        ("bluetoothInfo", r#"<BluetoothInfo BluetoothMACAddress="34:15:13:45:2F:93" />"#),
        (
            "networkInfo",
            r#"<networkInfo wifiProfileCount="1"><interfaces><interface type="WIFI_INTERFACE" name="wlan0" macAddress="9070658C9D4A" ipAddress="192.168.1.131" ssid="home" state="NETWORK_WIFI_CONNECTED" /></interfaces></networkInfo>"#,
        ),
        (
            "systemtimeout",
            "<systemtimeout><powersaving_enabled>true</powersaving_enabled></systemtimeout>",
        ),
        (
            "listMediaServers",
            r#"<ListMediaServersResponse><media_server id="1" ip="192.168.1.5" friendly_name="plex" /></ListMediaServersResponse>"#,
        ),
    ];
    for (endpoint, body) in documents {
        Mock::given(method("GET"))
            .and(path(format!("/{}", endpoint)))
            .respond_with(xml(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let bluetooth = client.get_bluetooth_info(true).await.unwrap();
    assert_eq!(bluetooth.mac_address.as_deref(), Some("34:15:13:45:2F:93"));
    let network = client.get_network_info(true).await.unwrap();
    assert_eq!(network.connected().and_then(|i| i.ssid.as_deref()), Some("home"));
    assert!(client.get_system_timeout(true).await.unwrap().powersaving_enabled);
    let servers = client.get_media_server_list(true).await.unwrap();
    assert_eq!(servers.media_servers[0].friendly_name.as_deref(), Some("plex"));

    // served from the cache; each document is fetched once
    assert_eq!(client.get_bluetooth_info(false).await.unwrap(), bluetooth);
    assert_eq!(client.get_network_info(false).await.unwrap(), network);
    assert_eq!(device_requests(&server).await.len(), 4);

    let err = client.get_product_cec_hdmi_control(true).await.unwrap_err();
    assert!(matches!(err, SoundTouchError::NotCapable { .. }));
    assert_eq!(device_requests(&server).await.len(), 4);
}

#[tokio::test]
async fn test_level_and_cec_controls_posted() {
    let (server, client) =
        setup(&["info", "audioproductlevelcontrols", "productcechdmicontrol"]).await;

    Mock::given(method("GET"))
        .and(path("/audioproductlevelcontrols"))
        .respond_with(xml(
            r#"<audioproductlevelcontrols><frontCenterSpeakerLevel value="0" minValue="-100" maxValue="100" step="10" /><rearSurroundSpeakersLevel value="0" minValue="-100" maxValue="100" step="10" /></audioproductlevelcontrols>"#,
        ))
        .mount(&server)
        .await;
    for endpoint in ["audioproductlevelcontrols", "productcechdmicontrol"] {
        Mock::given(method("POST"))
            .and(path(format!("/{}", endpoint)))
            .respond_with(status(endpoint))
            .mount(&server)
            .await;
    }

    let mut levels = client.get_audio_product_level_controls(true).await.unwrap();
    levels.rear_surround_speakers_level.value = -30;
    client.set_audio_product_level_controls(&levels).await.unwrap();
    client
        .set_product_cec_hdmi_control(&ProductCecHdmiControl::new(CecHdmiMode::Off))
        .await
        .unwrap();

    let posts: Vec<_> = device_requests(&server)
        .await
        .into_iter()
        .filter(|(method, _, _)| method == "POST")
        .map(|(_, _, body)| body)
        .collect();
    assert_eq!(
        posts,
        [
            r#"<audioproductlevelcontrols><frontCenterSpeakerLevel value="0" /><rearSurroundSpeakersLevel value="-30" /></audioproductlevelcontrols>"#,
            r#"<productcechdmicontrol cecmode="CEC_MODE_OFF" />"#,
        ]
    );

    // the cached document keeps its limits and takes the new value
    let cached: AudioProductLevelControls =
        client.cached(nodes::AUDIO_PRODUCT_LEVEL_CONTROLS).unwrap();
    assert_eq!(cached.rear_surround_speakers_level.value, -30);
    assert_eq!(cached.rear_surround_speakers_level.min_value, -100);
    let cec: ProductCecHdmiControl = client.cached(nodes::PRODUCT_CEC_HDMI_CONTROL).unwrap();
    assert_eq!(cec.cec_mode.as_deref(), Some("CEC_MODE_OFF"));
}

#[tokio::test]
async fn test_music_service_stations() {
    let urls = ["info", "navigate", "addStation", "removeStation", "enterBluetoothPairing"];
    let (server, client) = setup(&urls).await;

    Mock::given(method("POST"))
        .and(path("/navigate"))
        .respond_with(xml(
            r#"<navigateResponse source="PANDORA" sourceAccount="user"><totalItems>1</totalItems><items><item Playable="1"><name>Zach Williams Radio</name><type>stationurl</type><ContentItem source="PANDORA" type="stationurl" location="126740707481236361" sourceAccount="user" isPresetable="true"><itemName>Zach Williams Radio</itemName></ContentItem></item></items></navigateResponse>"#,
        ))
        .mount(&server)
        .await;
    for endpoint in ["addStation", "removeStation"] {
        Mock::given(method("POST"))
            .and(path(format!("/{}", endpoint)))
            .respond_with(status(endpoint))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/enterBluetoothPairing"))
        .respond_with(status("enterBluetoothPairing"))
        .mount(&server)
        .await;

    let navigate = Navigate::new("PANDORA", Some("user".to_string())).with_menu("radioStations");
    let stations = client.get_music_service_stations(&navigate).await.unwrap();
    assert_eq!(stations.total_items, 1);
    let station = stations.items[0].content_item.clone().unwrap();
    assert_eq!(station.location.as_deref(), Some("126740707481236361"));

    let add = AddStation::new("PANDORA", Some("user".to_string()), "R4328162", None);
    client.add_music_service_station(&add).await.unwrap();
    client
        .remove_music_service_station(&RemoveStation::from(station))
        .await
        .unwrap();
    client.enter_bluetooth_pairing().await.unwrap();

    let requests = device_requests(&server).await;
    let paths: Vec<_> = requests.iter().map(|(m, p, _)| format!("{} {}", m, p)).collect();
    assert_eq!(
        paths,
        [
            "POST /navigate",
            "POST /addStation",
            "POST /removeStation",
            "GET /enterBluetoothPairing"
        ]
    );
    assert!(requests[0].2.starts_with(
        r#"<navigate source="PANDORA" sourceAccount="user" menu="radioStations">"#
    ));
    assert_eq!(
        requests[1].2,
        r#"<addStation source="PANDORA" sourceAccount="user" token="R4328162" />"#
    );
    assert!(requests[2].2.starts_with("<ContentItem "));
    assert!(requests[2].2.contains(r#"location="126740707481236361""#));
}

// ── Keys and selection ──────────────────────────────────────────────

#[tokio::test]
async fn test_power_sends_press_then_release() {
    let (server, client) = setup(&["info", "key"]).await;

    Mock::given(method("POST"))
        .and(path("/key"))
        .respond_with(status("key"))
        .mount(&server)
        .await;

    client.power().await.unwrap();
    client.mute().await.unwrap();

    let bodies: Vec<_> = device_requests(&server)
        .await
        .into_iter()
        .map(|(_, _, body)| body)
        .collect();
    assert_eq!(
        bodies,
        [
            r#"<key state="press" sender="Gabbo">POWER</key>"#,
            r#"<key state="release" sender="Gabbo">POWER</key>"#,
            r#"<key state="press" sender="Gabbo">MUTE</key>"#,
        ]
    );
}

#[tokio::test]
async fn test_mute_twice_sends_two_presses() {
    let (server, client) = setup(&["info", "key"]).await;

    Mock::given(method("POST"))
        .and(path("/key"))
        .respond_with(status("key"))
        .mount(&server)
        .await;

    client.mute().await.unwrap();
    client.mute().await.unwrap();

    let requests = device_requests(&server).await;
    let press = r#"<key state="press" sender="Gabbo">MUTE</key>"#;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|(m, p, body)| m == "POST" && p == "/key" && body == press));
}

#[tokio::test]
async fn test_select_source_rejects_empty() {
    let (server, client) = setup(&["info", "select"]).await;

    let err = client.select_source("  ", None, NO_DELAY).await.unwrap_err();
    assert!(matches!(err, SoundTouchError::InvalidInput(_)));
    assert!(device_requests(&server).await.is_empty());
}

// ── Notifications ───────────────────────────────────────────────────

#[tokio::test]
async fn test_play_url_rejects_https() {
    let (server, client) = setup(&["info", "speaker", "nowPlaying"]).await;

    let err = client
        .play_url("https://example.com/chime.mp3", &NotificationOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SoundTouchError::InvalidInput(_)));
    assert!(device_requests(&server).await.is_empty());
}

#[tokio::test]
async fn test_tts_volume_clamped() {
    let (server, client) = setup(&["info", "speaker"]).await;

    Mock::given(method("POST"))
        .and(path("/speaker"))
        .respond_with(status("speaker"))
        .mount(&server)
        .await;

    let options = NotificationOptions::default().with_volume(90);
    let message = client
        .play_notification_tts("Hello there", None, &options)
        .await
        .unwrap();
    assert!(message.is_some());

    let body = &device_requests(&server).await[0].2;
    assert!(body.contains("<volume>70</volume>"));
    assert!(body.contains("Hello%20there"));
    assert!(body.contains("<service>TTS Notification</service>"));
    assert!(body.contains("<reason>Hello there</reason>"));

    assert!(client
        .play_notification_tts("", None, &options)
        .await
        .unwrap()
        .is_none());
}

// ── Zones ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_zone_lists_master_first() {
    let (server, client) = setup(&["info", "setZone", "getZone"]).await;

    Mock::given(method("POST"))
        .and(path("/setZone"))
        .respond_with(status("setZone"))
        .mount(&server)
        .await;

    let mut zone = Zone::new("AAA", "192.168.1.10");
    zone.add_member(ZoneMember::new("192.168.1.11", "BBB"));
    zone.add_member(ZoneMember::new("192.168.1.12", "CCC"));
    client.create_zone(&zone, NO_DELAY).await.unwrap();

    let body = &device_requests(&server).await[0].2;
    let position = |id: &str| body.find(&format!(">{}</member>", id)).unwrap();
    assert!(position("AAA") < position("BBB"));
    assert!(position("BBB") < position("CCC"));
    assert!(body.starts_with(r#"<zone master="AAA" senderIPAddress="192.168.1.10""#));

    let cached: Zone = client.cached(nodes::GET_ZONE).unwrap();
    assert_eq!(cached.members.len(), 3);
}

async fn mount_zone(server: &wiremock::MockServer) {
    Mock::given(method("GET"))
        .and(path("/getZone"))
        .respond_with(xml(
            r#"<zone master="AAA" senderIPAddress="192.168.1.10" senderIsMaster="true"><member ipaddress="192.168.1.10">AAA</member><member ipaddress="192.168.1.11">BBB</member></zone>"#,
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_zone_members_uses_current_master() {
    let (server, client) = setup(&["info", "getZone", "addZoneSlave"]).await;

    mount_zone(&server).await;
    Mock::given(method("POST"))
        .and(path("/addZoneSlave"))
        .respond_with(status("addZoneSlave"))
        .mount(&server)
        .await;

    client
        .add_zone_members(&[ZoneMember::new("192.168.1.12", "CCC")], NO_DELAY)
        .await
        .unwrap();

    let (method, path, body) = device_requests(&server).await.pop().unwrap();
    assert_eq!((method.as_str(), path.as_str()), ("POST", "/addZoneSlave"));
    assert_eq!(
        body,
        r#"<zone master="AAA"><member ipaddress="192.168.1.12">CCC</member></zone>"#
    );

    let cached: Zone = client.cached(nodes::GET_ZONE).unwrap();
    assert!(cached.contains("CCC"));
}

#[tokio::test]
async fn test_master_cannot_be_added_or_removed_as_member() {
    let (server, client) = setup(&["info", "getZone", "addZoneSlave", "removeZoneSlave"]).await;

    mount_zone(&server).await;
    for endpoint in ["addZoneSlave", "removeZoneSlave"] {
        Mock::given(method("POST"))
            .and(path(format!("/{}", endpoint)))
            .respond_with(status(endpoint))
            .expect(0)
            .mount(&server)
            .await;
    }

    let master = [ZoneMember::new("192.168.1.10", "AAA")];
    let err = client.add_zone_members(&master, NO_DELAY).await.unwrap_err();
    assert!(matches!(err, SoundTouchError::InvalidInput(_)));
    let err = client.remove_zone_members(&master, NO_DELAY).await.unwrap_err();
    assert!(matches!(err, SoundTouchError::InvalidInput(_)));

    // a master hidden among valid members is rejected too
    let mixed = [ZoneMember::new("192.168.1.12", "CCC"), master[0].clone()];
    assert!(client.add_zone_members(&mixed, NO_DELAY).await.is_err());

    let requests = device_requests(&server).await;
    assert!(requests.iter().all(|(method, _, _)| method == "GET"));
    assert!(!requests.iter().any(|(_, path, _)| path.ends_with("ZoneSlave")));

    let cached: Zone = client.cached(nodes::GET_ZONE).unwrap();
    assert!(cached.contains("AAA"));
}

#[tokio::test]
async fn test_add_then_remove_members_restores_zone() {
    let (server, client) = setup(&["info", "getZone", "addZoneSlave", "removeZoneSlave"]).await;

    mount_zone(&server).await;
    for endpoint in ["addZoneSlave", "removeZoneSlave"] {
        Mock::given(method("POST"))
            .and(path(format!("/{}", endpoint)))
            .respond_with(status(endpoint))
            .expect(1)
            .mount(&server)
            .await;
    }

    let members = [ZoneMember::new("192.168.1.12", "CCC")];
    client.add_zone_members(&members, NO_DELAY).await.unwrap();
    let cached: Zone = client.cached(nodes::GET_ZONE).unwrap();
    assert!(cached.contains("CCC"));

    client.remove_zone_members(&members, NO_DELAY).await.unwrap();
    let cached: Zone = client.cached(nodes::GET_ZONE).unwrap();
    assert!(!cached.contains("CCC"));
    assert!(cached.contains("AAA") && cached.contains("BBB"));

    let posts: Vec<_> = device_requests(&server)
        .await
        .into_iter()
        .filter(|(method, _, _)| method == "POST")
        .collect();
    let body = r#"<zone master="AAA"><member ipaddress="192.168.1.12">CCC</member></zone>"#;
    assert_eq!(posts.len(), 2);
    assert_eq!((posts[0].1.as_str(), posts[0].2.as_str()), ("/addZoneSlave", body));
    assert_eq!((posts[1].1.as_str(), posts[1].2.as_str()), ("/removeZoneSlave", body));
}

// ── Snapshot ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_restore_snapshot_order() {
    let (server, client) = setup(&["info", "nowPlaying", "volume", "select"]).await;

    Mock::given(method("GET"))
        .and(path("/nowPlaying"))
        .respond_with(xml(
            r#"<nowPlaying deviceID="AAA" source="TUNEIN"><ContentItem source="TUNEIN" type="stationurl" location="/v1/playback/station/s33828" isPresetable="true"><itemName>K-LOVE Radio</itemName></ContentItem><track>Song</track><playStatus>PLAY_STATE</playStatus></nowPlaying>"#,
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nowPlaying"))
        .respond_with(xml(
            r#"<nowPlaying deviceID="AAA" source="BLUETOOTH"><ContentItem source="BLUETOOTH" /></nowPlaying>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/volume"))
        .respond_with(xml(VOLUME))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/select"))
        .respond_with(status("select"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/volume"))
        .respond_with(status("volume"))
        .mount(&server)
        .await;

    client.store_snapshot().await.unwrap();
    assert!(!client.snapshot().is_empty());

    client.restore_snapshot(NO_DELAY).await.unwrap();

    let posts: Vec<_> = device_requests(&server)
        .await
        .into_iter()
        .filter(|(method, _, _)| method == "POST")
        .collect();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].1, "/select");
    assert!(posts[0].2.contains(r#"source="TUNEIN""#));
    assert_eq!(posts[1].1, "/select");
    assert!(posts[1].2.contains(r#"location="/v1/playback/station/s33828""#));
    assert_eq!(
        posts[2],
        ("POST".to_string(), "/volume".to_string(), "<volume>25</volume>".to_string())
    );
}

#[tokio::test]
async fn test_restore_skips_removed_volume() {
    let (server, client) = setup(&["info", "nowPlaying", "volume", "select"]).await;

    Mock::given(method("GET"))
        .and(path("/nowPlaying"))
        .respond_with(xml(
            r#"<nowPlaying deviceID="AAA" source="AUX"><ContentItem source="AUX" location="AUX"><itemName>AUX IN</itemName></ContentItem></nowPlaying>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/volume"))
        .respond_with(xml(VOLUME))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/select"))
        .respond_with(status("select"))
        .mount(&server)
        .await;

    client.store_snapshot().await.unwrap();
    assert!(client.remove_snapshot_setting(nodes::VOLUME));
    client.restore_snapshot(NO_DELAY).await.unwrap();

    let posts: Vec<_> = device_requests(&server)
        .await
        .into_iter()
        .filter(|(method, _, _)| method == "POST")
        .map(|(_, path, _)| path)
        .collect();
    // same source: only the content item is re-selected
    assert_eq!(posts, ["/select"]);
}
