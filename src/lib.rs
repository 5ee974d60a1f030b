//! PicWitness
//!
//! 写真をコンテンツアドレス型ストレージ（IPFS）に保存し、返ってきたハッシュと
//! 説明文をブロックチェーン台帳に記録する。画面側の写真リストは
//! 同期コントローラが台帳の状態に合わせて再構築する。

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod picture;
pub mod storage;
pub mod sync;

pub use pic_witness_common as common;
