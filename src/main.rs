// 不设置 windows_subsystem = "windows"：控制台是否显示由配置在运行时决定，
// 需要隐藏时由程序自己隐藏。

use std::process::ExitCode;

fn main() -> ExitCode {
    onekey::run()
}
