//! IReader LAN sync node
//!
//! 局域网同步节点：配置加载、日志初始化与依赖组装。

pub mod bootstrap;
