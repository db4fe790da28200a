#[actix_web::main]
async fn main() {
    if let Err(e) = portscope_lib::run().await {
        eprintln!("portscope failed: {}", e);
        std::process::exit(1);
    }
}
