#![no_main]

use libfuzzer_sys::fuzz_target;
use spades_protocol::Packet;

fuzz_target!(|data: &[u8]| {
    // Any input must decode or fail cleanly; whatever decodes must survive re-encoding
    if let Ok(packet) = Packet::decode(data) {
        let encoded = packet.generate();
        let again = Packet::decode(&encoded).expect("re-encoded packet must decode");
        assert_eq!(again.packet_type(), packet.packet_type());
    }
});
