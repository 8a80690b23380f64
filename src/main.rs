#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tour_validator_lib::run().await
}
