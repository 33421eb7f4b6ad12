pub mod volkswagen_meb;
