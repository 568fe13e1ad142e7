fn main() -> anyhow::Result<()> {
    quota_bar_lib::run()
}
