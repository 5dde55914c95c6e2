pub mod anthropic_client;
