use javelin::*;

fn addr(host: &str, weight: f64) -> ServiceAddress {
    let mut addr = ServiceAddress::new(host, 8080);
    addr.protocol = ServiceProtocol::Http;
    addr.weight = weight;
    addr
}

#[test]
fn selection_is_absent_on_an_empty_list() {
    assert_eq!(None, select_endpoint(&[]));
}

#[test]
fn singleton_lists_skip_the_draw() {
    let services = vec![addr("10.0.0.5", 2.5)];
    assert_eq!(Some(&services[0]), select_endpoint(&services));
}

#[test]
fn selection_converges_to_the_weight_ratio() {
    let services = vec![addr("10.0.0.5", 3.0), addr("10.0.0.6", 1.0)];
    let draws = 20_000;
    let mut heavy = 0usize;
    for _ in 0..draws {
        if select_endpoint(&services).unwrap().host == "10.0.0.5" {
            heavy += 1;
        }
    }
    let share = heavy as f64 / draws as f64;
    assert!((share - 0.75).abs() < 0.03, "expected ~0.75, got {}", share);
}

#[test]
fn display_matches_the_registry_format() {
    let plain = addr("localhost", 1.0);
    assert_eq!("http://localhost:8080", plain.to_string());

    let mut named = addr("10.0.0.1", 1.0);
    named.port = 443;
    named.service = "svc.example.com".to_owned();
    assert_eq!("http://svc.example.com:443", named.to_string());
}

#[test]
fn selected_addresses_carry_their_endpoint() {
    let services = vec![addr("10.0.0.5", 1.0)];
    let picked = select_endpoint(&services).unwrap();
    assert_eq!(
        Endpoint::Ip("10.0.0.5:8080".parse().unwrap()),
        picked.endpoint()
    );
}
