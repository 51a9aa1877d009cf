/**
 * HTTP surface of the local Farol daemon.
 */
pub mod http;
