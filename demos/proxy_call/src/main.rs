use std::sync::Arc;

use javelin::*;

#[service_contract]
pub trait Arith {
    fn add(&self, a: u64, b: u64) -> Result<u64>;
    async fn mul(&self, a: u64, b: u64) -> Result<u64>;
}

/// stands in for a transport-backed executor; computes replies locally.
struct LocalExecutor;

#[async_trait]
impl ProxyExecutor for LocalExecutor {
    fn dispatcher(&self) -> DispatcherKind {
        DispatcherKind::of::<LocalExecutor>("LocalExecutor")
    }

    fn invoke(&self, method: &ResolvedMethod, mut args: Args) -> Result<ArgValue> {
        let b = *args.pop().unwrap().downcast::<u64>().unwrap();
        let a = *args.pop().unwrap().downcast::<u64>().unwrap();
        match method.name {
            "add" => Ok(Box::new(a + b) as ArgValue),
            other => Err(Error::new(
                ErrorKind::Client,
                format!("no handler for {}", other),
            )),
        }
    }

    async fn invoke_async(&self, _method: &ResolvedMethod, _args: Args) -> Result<()> {
        Ok(())
    }

    async fn invoke_async_typed(&self, method: &ResolvedMethod, mut args: Args) -> Result<ArgValue> {
        let b = *args.pop().unwrap().downcast::<u64>().unwrap();
        let a = *args.pop().unwrap().downcast::<u64>().unwrap();
        match method.name {
            "mul" => Ok(Box::new(a * b) as ArgValue),
            other => Err(Error::new(
                ErrorKind::Client,
                format!("no handler for {}", other),
            )),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut primary = ServiceAddress::new("10.0.0.5", 8080);
    primary.protocol = ServiceProtocol::Http;
    primary.weight = 3.0;
    let mut standby = ServiceAddress::new("10.0.0.6", 8080);
    standby.protocol = ServiceProtocol::Http;

    let services = vec![primary, standby];
    let picked = select_endpoint(&services).unwrap();
    println!("selected {}", picked);

    let generator = ProxyGenerator::new();
    let proxy: Proxy<ArithContract> = generator.create_proxy(Arc::new(LocalExecutor)).unwrap();

    let mut a = 1;
    while a <= 5 {
        let sum = proxy.add(a, 10).unwrap();
        let product = proxy.mul(a, 10).await.unwrap();
        println!("received: {} {}", sum, product);
        a += 1;
    }
}
