// Domain layer - Plain data flowing through the replay pipeline
pub mod curve;
pub mod feed;
pub mod record;
pub mod window;
