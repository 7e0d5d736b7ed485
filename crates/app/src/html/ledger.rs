pub const LEDGER_HTML: &str = r#"
<!doctype html>
<html lang="en" class="h-full dark">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Ledger Viewer</title>

  <link rel="preconnect" href="https://fonts.googleapis.com" />
  <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin />
  <link href="https://fonts.googleapis.com/css2?family=Rajdhani:wght@500;600;700&display=swap" rel="stylesheet" />
  <style type="text/tailwindcss">
    @theme {
      --color-mission-bg: #050B16;
      --color-mission-panel: #0A1628;
      --color-mission-accent: #38bdf8;
      --color-mission-danger: #fb7185;
      --color-mission-success: #4ade80;
    }

    @layer base {
      body { @apply min-h-full bg-mission-bg text-slate-100 font-[Rajdhani]; }
      [x-cloak] { display: none !important; }
    }
  </style>
  <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  <script defer src="https://cdn.jsdelivr.net/npm/alpinejs@3.13.5/dist/cdn.min.js" crossorigin="anonymous"></script>
</head>

<body x-data="ledgerViewer()" x-init="load()">
  <div class="mx-auto flex max-w-5xl flex-col gap-3 p-4">
    <header class="flex items-center gap-4 rounded-lg border border-sky-400/20 bg-mission-panel px-4 py-2">
      <h1 class="text-xl font-bold tracking-widest text-mission-accent">LEDGER</h1>
      <span :class="verdictClass()" x-text="verdictText()"></span>
      <div class="ml-auto flex gap-2">
        <button class="rounded-md border border-sky-400/40 px-3 py-1 text-sm uppercase hover:bg-sky-400/20"
          @click="load()">Reload</button>
        <a class="rounded-md border border-sky-400/40 px-3 py-1 text-sm uppercase hover:bg-sky-400/20"
          href="/">Dashboard</a>
      </div>
    </header>

    <p x-show="error" x-cloak class="text-mission-danger" x-text="error"></p>
    <p x-show="loading" class="text-slate-400">Loading…</p>

    <template x-for="block in blocks" :key="block.index + block.hash">
      <article class="rounded-lg border border-sky-400/20 bg-mission-panel p-4">
        <div class="flex flex-wrap items-baseline gap-4">
          <span class="text-lg font-bold text-mission-accent" x-text="`#${block.index}`"></span>
          <span class="text-slate-400" x-text="block.timestamp"></span>
        </div>
        <dl class="mt-2 grid grid-cols-[8rem_1fr] gap-x-3 font-mono text-xs">
          <dt class="text-slate-400">hash</dt>
          <dd class="break-all" x-text="block.hash"></dd>
          <dt class="text-slate-400">previous hash</dt>
          <dd class="break-all" x-text="block.previous_hash"></dd>
        </dl>
        <pre class="mt-3 overflow-auto rounded bg-black/40 p-3 text-xs" x-text="block.data"></pre>
      </article>
    </template>
  </div>

  <script>
    function ledgerViewer() {
      return {
        blocks: [],
        verdict: {},
        error: '',
        loading: false,

        async load() {
          this.loading = true;
          try {
            const response = await fetch('/api/ledger');
            const body = await response.json();
            if (!response.ok) throw new Error(body.error || `HTTP ${response.status}`);
            this.blocks = body.blocks;
            this.verdict = body.verdict || {};
            this.error = '';
          } catch (err) {
            this.error = `Could not load ledger: ${err.message}`;
          } finally {
            this.loading = false;
          }
        },

        verdictText() {
          return this.verdict.summary || 'Ledger status pending';
        },

        verdictClass() {
          if (!this.verdict.verdict) return 'text-slate-400';
          return this.verdict.verdict.valid ? 'text-mission-success' : 'text-mission-danger font-semibold';
        }
      };
    }
  </script>
</body>

</html>
"#;
