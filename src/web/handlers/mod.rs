pub mod funnel;
pub mod leads;
pub mod public;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    public::configure(cfg);
    funnel::configure(cfg);
    leads::configure(cfg);
}
