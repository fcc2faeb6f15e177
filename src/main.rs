use actix_web::{middleware, web, App, HttpServer};
use log::info;

use share_drive::app_state::AppState;
use share_drive::share::handlers::{download_handler, upload_handler};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if log4rs::init_file("server_log.yaml", Default::default()).is_err() {
        env_logger::init();
    }

    let state = AppState::new();
    let server = state.config.server.clone();
    let upload_path = state.config.share.upload_path.clone();
    let get_route = format!(
        "{}/{{file}}",
        state.config.share.get_path.trim_end_matches('/')
    );

    info!("Starting server on {}:{}", server.host, server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .route(&upload_path, web::post().to(upload_handler))
            .route(&get_route, web::get().to(download_handler))
    })
    .workers(server.workers)
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}
