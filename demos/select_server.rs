use steer::{Attributes, Decision, Document};

const POLICY: &str = r#"
selectServer {
    if id="beta-group" {
        equals param="group" { value "beta" }
        server name="beta-lb" url="http://beta.example.com:8080" path="BETA"
    }
    if id="office-network" {
        inIpRange param="clientIp" { value 10.10.0.0/16 }
        server name="office-lb" url="http://office.example.com:8080" path="OFFICE"
    }
    distribution {
        percent value=10 { server name="canary" url="http://canary.example.com" path="CANARY" }
        default { server name="stable" url="http://stable.example.com" path="STABLE" }
    }
}
"#;

fn main() {
    let doc = Document::from_text(POLICY)
        .expect("failed to build policy document")
        .into_select_server();

    let requests = [
        Attributes::new().set("group", "beta").set("accountId", "acct-1"),
        Attributes::new()
            .set("clientIp", "10.10.3.7")
            .set("accountId", "acct-2"),
        Attributes::new().set("accountId", "acct-3"),
        Attributes::new(),
    ];

    for attrs in &requests {
        match doc.decide(attrs) {
            Decision::Matched {
                rule_id,
                consequence,
            } => println!(
                "rule {:?} -> {}",
                rule_id.unwrap_or("<anonymous>"),
                consequence
            ),
            Decision::Distributed { consequence } => println!("distribution -> {consequence}"),
            Decision::NoMatch => println!("no match"),
        }
    }
}
