// src/rpc.rs
//
// gRPC face of the service. Methods delegate to the same services the HTTP
// handlers use.

pub mod user_grpc;

pub use user_grpc::UserGrpcService;
