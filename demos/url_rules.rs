use steer::{Attributes, Document};

const POLICY: &str = r#"
urlRules {
    if id="secure-clients" {
        equals param="secure" { value "true" }
        urlParams protocol="xres" port=10004
    }
    if id="ipv6-estate" {
        matches param="estate" { value "v6-.*" }
        urlParams ipProtocolVersion="ipv6"
    }
    default {
        urlParams protocol="xre" urn="redirector" port=10001 ipProtocolVersion="ipv4"
    }
}
"#;

fn main() {
    let doc = Document::from_text(POLICY)
        .expect("failed to build policy document")
        .into_url_rules();

    let requests = [
        Attributes::new().set("secure", "true").set("estate", "v6-east"),
        Attributes::new().set("secure", "false"),
    ];

    for attrs in &requests {
        let decision = doc.resolve(attrs);
        let params = decision.params();
        println!(
            "protocol={:?} urn={:?} port={:?} ipVersion={:?} via {:?}",
            params.protocol,
            params.urn,
            params.port,
            params.ip_protocol_version,
            decision.applied_rules(),
        );
    }
}
