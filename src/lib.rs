pub mod dto {
    pub mod draft_dto;
    pub mod message_dto;
    pub mod player_dto;
    pub mod roster_dto;
}

pub mod routes {
    pub mod draft;
}

pub mod services {
    pub mod coordinator;
    pub mod dispatcher;
    pub mod draft_machine;
    pub mod persistence;
    pub mod publisher;
    pub mod registry;
    pub mod roster_allocator;
    pub mod snake_order;
    pub mod websocket;
}

pub mod config;
pub mod error;
pub mod server;
