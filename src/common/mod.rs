pub mod client {
    pub mod models {
        pub mod auth;
        pub mod common;
        pub mod contact;
        pub mod message;
    }
    pub mod client;
    pub mod domain;
    pub mod error;
    pub mod response;
    pub mod transport;
}

pub mod logger;
