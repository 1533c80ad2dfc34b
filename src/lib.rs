pub mod shared {
    pub mod core {
        pub mod clock;
    }
    pub mod infrastructure {
        pub mod event_publisher;
        pub mod event_store;
        pub mod metrics_registry;
    }
}

pub mod modules {
    pub mod aggregates {
        pub mod use_cases {
            pub mod save_events {
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod list_events {
                pub mod inbound {
                    pub mod http;
                }
            }
        }
    }
}

pub mod shell;
