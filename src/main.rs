fn main() {
    evolnote_lib::run()
}
