pub mod sendgrid;
pub mod stripe;
